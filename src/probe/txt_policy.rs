use super::{Probe, ProbeKind};
use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::{DnsResolver, Record, RecordType};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Looks for a mail-authentication policy published as a TXT record.
///
/// SPF and DMARC share this query pattern and differ only in the owner
/// name and the version tag they look for.
pub struct TxtPolicyProbe {
    kind: ProbeKind,
    name: &'static str,
    description: &'static str,
    /// Label prepended to the domain, if the policy lives below it.
    label: Option<&'static str>,
    /// Lowercase version tag that identifies the policy record.
    tag: &'static str,
    /// Short record name used in detail lines.
    record: &'static str,
}

impl TxtPolicyProbe {
    pub fn spf() -> Self {
        Self {
            kind: ProbeKind::Spf,
            name: "SPF Record",
            description: "Sender Policy Framework configuration",
            label: None,
            tag: "v=spf1",
            record: "SPF",
        }
    }

    pub fn dmarc() -> Self {
        Self {
            kind: ProbeKind::Dmarc,
            name: "DMARC Record",
            description: "Domain-based Message Authentication",
            label: Some("_dmarc"),
            tag: "v=dmarc1",
            record: "DMARC",
        }
    }

    fn query_name(&self, target: &ScanTarget) -> String {
        match self.label {
            Some(label) => target.subdomain(label),
            None => target.domain.clone(),
        }
    }
}

#[async_trait]
impl Probe for TxtPolicyProbe {
    fn kind(&self) -> ProbeKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding {
        let mut finding = self.finding(Status::Missing);
        let query = self.query_name(target);

        match resolver.resolve(&query, RecordType::Txt).await {
            Ok(records) => {
                let policy = records.iter().find_map(|record| match record {
                    Record::Txt(data) => {
                        let text = String::from_utf8_lossy(data);
                        text.to_lowercase().contains(self.tag).then(|| text.into_owned())
                    }
                    _ => None,
                });

                match policy {
                    Some(text) => finding.mark(Status::Safe, format!("{} record found: {}", self.record, text)),
                    None => finding.push_detail(format!("No {} record configured", self.record)),
                }
            }
            Err(e) => {
                if e.is_inconclusive() {
                    warn!(name = %query, kind = e.kind(), error = %e, "TXT lookup inconclusive");
                } else {
                    debug!(name = %query, kind = e.kind(), "No TXT records");
                }
                finding.push_detail(format!("No {} record found", self.record));
            }
        }

        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DnsError;
    use crate::resolver::MockResolver;

    fn target() -> ScanTarget {
        ScanTarget::new("example.test", "127.0.0.1").unwrap()
    }

    fn txt(s: &str) -> Record {
        Record::Txt(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_spf_found() {
        let mock = MockResolver::new().with_records(
            "example.test",
            vec![txt("google-site-verification=abc"), txt("v=spf1 include:_spf.example.com ~all")],
        );
        let finding = TxtPolicyProbe::spf().run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Safe);
        assert_eq!(
            finding.details,
            vec!["SPF record found: v=spf1 include:_spf.example.com ~all"]
        );
    }

    #[tokio::test]
    async fn test_spf_match_is_case_insensitive_and_first_wins() {
        let mock = MockResolver::new().with_records(
            "example.test",
            vec![txt("V=SPF1 -all"), txt("v=spf1 ~all")],
        );
        let finding = TxtPolicyProbe::spf().run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Safe);
        assert_eq!(finding.details, vec!["SPF record found: V=SPF1 -all"]);
    }

    #[tokio::test]
    async fn test_spf_not_configured() {
        let mock = MockResolver::new().with_records("example.test", vec![txt("some other text")]);
        let finding = TxtPolicyProbe::spf().run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Missing);
        assert_eq!(finding.details, vec!["No SPF record configured"]);
    }

    #[tokio::test]
    async fn test_spf_lookup_failure() {
        let mock = MockResolver::new().with_error("example.test", RecordType::Txt, DnsError::Timeout);
        let finding = TxtPolicyProbe::spf().run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Missing);
        assert_eq!(finding.details, vec!["No SPF record found"]);
    }

    #[tokio::test]
    async fn test_dmarc_queries_underscore_label() {
        let mock = MockResolver::new().with_records("_dmarc.example.test", vec![txt("v=DMARC1; p=reject")]);
        let finding = TxtPolicyProbe::dmarc().run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Safe);
        assert_eq!(finding.details, vec!["DMARC record found: v=DMARC1; p=reject"]);
        assert_eq!(mock.queries(), vec![("_dmarc.example.test".to_string(), RecordType::Txt)]);
    }

    #[tokio::test]
    async fn test_dmarc_missing() {
        let finding = TxtPolicyProbe::dmarc().run(&target(), &MockResolver::new()).await;

        assert_eq!(finding.status, Status::Missing);
        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.details, vec!["No DMARC record found"]);
    }
}
