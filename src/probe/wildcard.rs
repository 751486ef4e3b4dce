use super::{Probe, ProbeKind};
use crate::error::DnsError;
use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::{DnsResolver, RecordType};
use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

/// Detects catch-all records by resolving a name nobody registered.
pub struct WildcardProbe;

impl WildcardProbe {
    /// Random six digit label.
    pub fn random_label() -> String {
        rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
    }

    pub fn probe_name(target: &ScanTarget, label: &str) -> String {
        target.subdomain(&format!("{}.test", label))
    }

    async fn check(&self, target: &ScanTarget, resolver: &dyn DnsResolver, label: &str) -> Finding {
        let mut finding = self.finding(Status::Safe);
        let name = Self::probe_name(target, label);

        match resolver.resolve(&name, RecordType::A).await {
            Ok(_) => finding.mark(Status::Warning, format!("Wildcard detected: {} resolved", name)),
            Err(DnsError::NameError { .. }) => finding.push_detail("No wildcard DNS detected"),
            Err(e) => {
                if e.is_inconclusive() {
                    warn!(%name, kind = e.kind(), error = %e, "Wildcard probe inconclusive");
                } else {
                    debug!(%name, kind = e.kind(), "Wildcard probe name has no address");
                }
                finding.push_detail("No wildcard detected or query blocked");
            }
        }
        finding
    }
}

#[async_trait]
impl Probe for WildcardProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Wildcard
    }

    fn name(&self) -> &'static str {
        "Wildcard DNS"
    }

    fn description(&self) -> &'static str {
        "Checks for wildcard DNS records"
    }

    fn severity(&self) -> Severity {
        Severity::Low
    }

    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding {
        self.check(target, resolver, &Self::random_label()).await
    }
}
