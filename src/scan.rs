//! Scan orchestration.
//!
//! [`Scanner`] runs a probe set against one target and assembles the
//! [`Report`]. [`run_scan`] is the entry point used by the CLI: it validates
//! input, builds a resolver pinned to the target nameserver, and scans.

use crate::config::Config;
use crate::error::ScanError;
use crate::model::{Finding, Report, ScanTarget, Status};
use crate::probe::{all_probes, Probe};
use crate::resolver::{DnsResolver, HickoryResolver};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a scan executes its probes.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Run probes concurrently. Findings keep the declared order either way.
    pub parallel: bool,

    /// Deadline applied to each probe separately.
    pub probe_timeout: Option<Duration>,
}

/// Runs a probe set against a target through one resolver.
pub struct Scanner {
    resolver: Arc<dyn DnsResolver>,
    probes: Vec<Box<dyn Probe>>,
    options: ScanOptions,
}

impl Scanner {
    pub fn new(resolver: Arc<dyn DnsResolver>, probes: Vec<Box<dyn Probe>>, options: ScanOptions) -> Self {
        Self {
            resolver,
            probes,
            options,
        }
    }

    /// Scans `target`, returning exactly one finding per probe in probe order.
    pub async fn run(&self, target: &ScanTarget) -> Report {
        let timestamp = Utc::now();
        info!(domain = %target.domain, nameserver = %target.nameserver, probes = self.probes.len(), "Starting scan");

        let findings = if self.options.parallel {
            join_all(self.probes.iter().map(|probe| self.run_probe(probe.as_ref(), target))).await
        } else {
            let mut findings = Vec::with_capacity(self.probes.len());
            for probe in &self.probes {
                findings.push(self.run_probe(probe.as_ref(), target).await);
            }
            findings
        };

        let report = Report::new(target, timestamp, findings);
        let stats = report.stats();
        info!(
            domain = %target.domain,
            safe = stats.safe,
            warning = stats.warning,
            vulnerable = stats.vulnerable,
            score = stats.score,
            "Scan finished"
        );
        report
    }

    async fn run_probe(&self, probe: &dyn Probe, target: &ScanTarget) -> Finding {
        debug!(probe = %probe.kind(), "Running probe");
        let resolver = self.resolver.as_ref();

        let finding = match self.options.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, probe.run(target, resolver)).await {
                Ok(finding) => finding,
                Err(_) => {
                    warn!(probe = %probe.kind(), seconds = limit.as_secs(), "Probe timed out");
                    probe
                        .finding(Status::Error)
                        .with_detail(format!("Probe did not complete within {}s", limit.as_secs()))
                }
            },
            None => probe.run(target, resolver).await,
        };

        debug!(probe = %probe.kind(), status = %finding.status, "Probe finished");
        finding
    }
}

/// Scans `domain` against `nameserver` with the probe set and settings from `config`.
///
/// # Errors
///
/// Returns [`ScanError::EmptyDomain`] if `domain` is blank, or
/// [`ScanError::InvalidNameserver`] if `nameserver` is not an IP address.
/// Individual probe failures never fail the scan.
///
/// # Example
///
/// ```no_run
/// use dnsposture::{run_scan, Config};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let report = run_scan("example.test", "127.0.0.1", &Config::default()).await?;
///     println!("score: {}", report.stats().score);
///     Ok(())
/// }
/// ```
pub async fn run_scan(domain: &str, nameserver: &str, config: &Config) -> Result<Report, ScanError> {
    let target = ScanTarget::new(domain, nameserver)?;
    let resolver = HickoryResolver::new(&target.nameserver, &config.resolver)?;

    let scanner = Scanner::new(
        Arc::new(resolver),
        all_probes(config.resolver.zone_transfer_timeout()),
        config.scan_options(),
    );
    Ok(scanner.run(&target).await)
}
