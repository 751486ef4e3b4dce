use super::{Probe, ProbeKind};
use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::{nameservers, DnsResolver, ZoneRecord};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Checks whether the target nameserver hands out the whole zone.
///
/// One transfer is attempted per delegated NS name, always against the
/// configured nameserver address: that is the server under test.
pub struct ZoneTransferProbe {
    timeout: Duration,
}

impl ZoneTransferProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Number of distinct owner names in a transferred zone.
    pub fn node_count(records: &[ZoneRecord]) -> usize {
        records
            .iter()
            .map(|r| r.name.to_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }
}

#[async_trait]
impl Probe for ZoneTransferProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Axfr
    }

    fn name(&self) -> &'static str {
        "Zone Transfer (AXFR)"
    }

    fn description(&self) -> &'static str {
        "Checks if zone transfers are allowed"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding {
        let mut finding = self.finding(Status::Safe);

        let ns = nameservers(resolver, &target.domain).await;
        if ns.is_empty() {
            finding.mark(Status::Error, "Could not resolve nameservers");
            return finding;
        }

        let mut allowed = false;
        for name in &ns {
            match resolver.transfer_zone(&target.domain, self.timeout).await {
                Ok(records) if !records.is_empty() => {
                    let nodes = Self::node_count(&records);
                    warn!(domain = %target.domain, ns = %name, records = records.len(), nodes, "Zone transfer allowed");
                    finding.mark(
                        Status::Vulnerable,
                        format!("AXFR allowed on {}! Retrieved {} records", name, nodes),
                    );
                    allowed = true;
                }
                Ok(_) => debug!(ns = %name, "Zone transfer returned no records"),
                Err(e) => debug!(ns = %name, kind = e.kind(), error = %e, "Zone transfer denied"),
            }
        }

        if !allowed {
            finding.push_detail("Zone transfers properly restricted");
        }
        finding
    }
}
