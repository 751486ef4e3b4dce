use super::{Probe, ProbeKind};
use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::{DnsResolver, RecordType};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Subdomain labels that commonly outlive the service they pointed at.
pub const TAKEOVER_CANDIDATES: [&str; 4] = ["oldservice", "dev", "staging", "test"];

/// Flags candidate subdomains aliased to a zone outside the scanned domain.
pub struct CnameTakeoverProbe;

impl CnameTakeoverProbe {
    /// True when `target` looks like a host in some other zone.
    pub fn is_external(domain: &str, target: &str) -> bool {
        target.contains('.') && !target.ends_with(domain)
    }
}

#[async_trait]
impl Probe for CnameTakeoverProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Cname
    }

    fn name(&self) -> &'static str {
        "CNAME Takeover Risk"
    }

    fn description(&self) -> &'static str {
        "Potential subdomain takeover vulnerabilities"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding {
        let mut finding = self.finding(Status::Safe);
        let mut issues = Vec::new();

        for label in TAKEOVER_CANDIDATES {
            let subdomain = target.subdomain(label);
            let alias = match resolver.resolve(&subdomain, RecordType::Cname).await {
                Ok(records) => records.first().and_then(|r| r.target()).map(str::to_string),
                Err(e) => {
                    if e.is_inconclusive() {
                        warn!(%subdomain, kind = e.kind(), error = %e, "CNAME lookup inconclusive");
                    } else {
                        debug!(%subdomain, kind = e.kind(), "No CNAME for candidate");
                    }
                    None
                }
            };

            if let Some(alias) = alias {
                if Self::is_external(&target.domain, &alias) {
                    issues.push((subdomain, alias));
                }
            }
        }

        if issues.is_empty() {
            finding.push_detail("No obvious risky CNAMEs found");
        } else {
            finding.status = Status::Warning;
            for (subdomain, alias) in issues {
                finding.push_detail(format!("{} -> {} (external CNAME)", subdomain, alias));
            }
        }
        finding
    }
}
