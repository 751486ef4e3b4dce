use super::{Probe, ProbeKind};
use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::{DnsResolver, Record, RecordType};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Checks that every mail exchanger resolves to an address.
pub struct MxProbe;

#[async_trait]
impl Probe for MxProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Mx
    }

    fn name(&self) -> &'static str {
        "MX Records"
    }

    fn description(&self) -> &'static str {
        "Mail exchanger configuration"
    }

    fn severity(&self) -> Severity {
        Severity::Medium
    }

    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding {
        let mut finding = self.finding(Status::Safe);

        let exchangers: Vec<(u16, String)> = match resolver.resolve(&target.domain, RecordType::Mx).await {
            Ok(records) => records
                .into_iter()
                .filter_map(|r| match r {
                    Record::Mx { preference, exchange } => Some((preference, exchange)),
                    _ => None,
                })
                .collect(),
            Err(e) => {
                if e.is_inconclusive() {
                    warn!(domain = %target.domain, kind = e.kind(), error = %e, "MX lookup inconclusive");
                } else {
                    debug!(domain = %target.domain, kind = e.kind(), "No MX records");
                }
                Vec::new()
            }
        };

        if exchangers.is_empty() {
            finding.mark(Status::Warning, "No MX records found");
            return finding;
        }

        let mut problems = Vec::new();
        for (preference, exchange) in exchangers {
            finding.push_detail(format!("MX: {} (priority {})", exchange, preference));
            if let Err(e) = resolver.resolve(&exchange, RecordType::A).await {
                debug!(%exchange, kind = e.kind(), error = %e, "Mail exchanger does not resolve");
                problems.push(exchange);
            }
        }

        if !problems.is_empty() {
            finding.mark(
                Status::Vulnerable,
                format!("Warning: MX points to non-resolving hosts: {}", problems.join(", ")),
            );
        }
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DnsError;
    use crate::resolver::MockResolver;
    use std::net::Ipv4Addr;

    fn target() -> ScanTarget {
        ScanTarget::new("example.test", "127.0.0.1").unwrap()
    }

    fn mx(preference: u16, exchange: &str) -> Record {
        Record::Mx {
            preference,
            exchange: exchange.to_string(),
        }
    }

    #[tokio::test]
    async fn test_no_mx_is_warning() {
        let finding = MxProbe.run(&target(), &MockResolver::new()).await;

        assert_eq!(finding.status, Status::Warning);
        assert_eq!(finding.details, vec!["No MX records found"]);
    }

    #[tokio::test]
    async fn test_mx_lookup_failure_is_warning() {
        let mock = MockResolver::new().with_error("example.test", RecordType::Mx, DnsError::ServerFailure);
        let finding = MxProbe.run(&target(), &mock).await;
        assert_eq!(finding.status, Status::Warning);
    }

    #[tokio::test]
    async fn test_all_exchangers_resolve() {
        let mock = MockResolver::new()
            .with_records("example.test", vec![mx(10, "mail.example.test"), mx(20, "backup.example.test")])
            .with_records("mail.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 25))])
            .with_records("backup.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 26))]);
        let finding = MxProbe.run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Safe);
        assert_eq!(
            finding.details,
            vec![
                "MX: mail.example.test (priority 10)",
                "MX: backup.example.test (priority 20)",
            ]
        );
    }

    #[tokio::test]
    async fn test_non_resolving_exchanger_is_vulnerable() {
        let mock = MockResolver::new().with_records("example.test", vec![mx(10, "mail.example.test")]);
        let finding = MxProbe.run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Vulnerable);
        assert_eq!(
            finding.details,
            vec![
                "MX: mail.example.test (priority 10)",
                "Warning: MX points to non-resolving hosts: mail.example.test",
            ]
        );
    }

    #[tokio::test]
    async fn test_every_problem_host_listed() {
        let mock = MockResolver::new()
            .with_records(
                "example.test",
                vec![mx(10, "mx1.example.test"), mx(20, "mx2.example.test"), mx(30, "mx3.example.test")],
            )
            .with_records("mx2.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 2))]);
        let finding = MxProbe.run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Vulnerable);
        assert_eq!(
            finding.details.last().unwrap(),
            "Warning: MX points to non-resolving hosts: mx1.example.test, mx3.example.test"
        );
    }
}
