use super::{Probe, ProbeKind};
use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::{nameservers, DnsResolver, RecordType};
use async_trait::async_trait;
use tracing::warn;

/// Checks that every delegated nameserver has an address.
///
/// All nameservers are checked even after the first failure.
pub struct NameserverHealthProbe;

#[async_trait]
impl Probe for NameserverHealthProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ns
    }

    fn name(&self) -> &'static str {
        "Nameserver Health"
    }

    fn description(&self) -> &'static str {
        "Nameserver availability and configuration"
    }

    fn severity(&self) -> Severity {
        Severity::High
    }

    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding {
        let mut finding = self.finding(Status::Safe);

        let ns = nameservers(resolver, &target.domain).await;
        if ns.is_empty() {
            finding.mark(Status::Vulnerable, "No nameservers found");
            return finding;
        }

        for name in ns {
            match resolver.resolve(&name, RecordType::A).await {
                Ok(records) => {
                    let address = records.first().map(|r| r.to_string()).unwrap_or_default();
                    finding.push_detail(format!("NS {} -> {}", name, address));
                }
                Err(e) => {
                    warn!(ns = %name, kind = e.kind(), error = %e, "Nameserver does not resolve");
                    finding.mark(Status::Vulnerable, format!("NS {} not resolving: {}", name, e));
                }
            }
        }
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DnsError;
    use crate::resolver::{MockResolver, Record};
    use std::net::Ipv4Addr;

    fn target() -> ScanTarget {
        ScanTarget::new("example.test", "127.0.0.1").unwrap()
    }

    fn ns(names: &[&str]) -> Vec<Record> {
        names.iter().map(|n| Record::Ns(n.to_string())).collect()
    }

    #[tokio::test]
    async fn test_no_nameservers_stops_early() {
        let mock = MockResolver::new();
        let finding = NameserverHealthProbe.run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Vulnerable);
        assert_eq!(finding.details, vec!["No nameservers found"]);
        assert_eq!(mock.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_all_nameservers_resolve() {
        let mock = MockResolver::new()
            .with_records("example.test", ns(&["ns1.example.test", "ns2.example.test"]))
            .with_records("ns1.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 53))])
            .with_records("ns2.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 54))]);
        let finding = NameserverHealthProbe.run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Safe);
        assert_eq!(
            finding.details,
            vec!["NS ns1.example.test -> 192.0.2.53", "NS ns2.example.test -> 192.0.2.54"]
        );
    }

    #[tokio::test]
    async fn test_failure_is_sticky_and_probing_continues() {
        let mock = MockResolver::new()
            .with_records("example.test", ns(&["ns1.example.test", "ns2.example.test"]))
            .with_error("ns1.example.test", RecordType::A, DnsError::Timeout)
            .with_records("ns2.example.test", vec![Record::A(Ipv4Addr::new(192, 0, 2, 54))]);
        let finding = NameserverHealthProbe.run(&target(), &mock).await;

        assert_eq!(finding.status, Status::Vulnerable);
        assert_eq!(
            finding.details,
            vec![
                "NS ns1.example.test not resolving: The DNS operation timed out",
                "NS ns2.example.test -> 192.0.2.54",
            ]
        );
    }

    #[tokio::test]
    async fn test_nxdomain_message_names_host() {
        let mock = MockResolver::new().with_records("example.test", ns(&["ns1.elsewhere.test"]));
        let finding = NameserverHealthProbe.run(&target(), &mock).await;

        assert_eq!(
            finding.details,
            vec!["NS ns1.elsewhere.test not resolving: The DNS query name does not exist: ns1.elsewhere.test"]
        );
    }
}
