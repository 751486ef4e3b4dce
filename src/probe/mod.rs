//! DNS misconfiguration probes.
//!
//! This module provides the [`Probe`] trait and the fixed battery of checks
//! a scan runs. Each probe is independent: it only reads from the resolver
//! and always produces exactly one [`Finding`].
//!
//! # Probe Set
//!
//! | Probe | Id | Severity |
//! |-------|----|----------|
//! | [`ZoneTransferProbe`] | `axfr` | critical |
//! | [`TxtPolicyProbe::spf`] | `spf` | medium |
//! | [`TxtPolicyProbe::dmarc`] | `dmarc` | medium |
//! | [`WildcardProbe`] | `wildcard` | low |
//! | [`MxProbe`] | `mx` | medium |
//! | [`CnameTakeoverProbe`] | `cname` | high |
//! | [`NameserverHealthProbe`] | `ns` | high |
//!
//! # Example
//!
//! ```no_run
//! use dnsposture::probe::{all_probes, Probe};
//! use dnsposture::resolver::{HickoryResolver, ResolverSettings};
//! use dnsposture::ScanTarget;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = ResolverSettings::default();
//!     let resolver = HickoryResolver::new("127.0.0.1", &settings)?;
//!     let target = ScanTarget::new("example.test", "127.0.0.1")?;
//!
//!     for probe in all_probes(settings.zone_transfer_timeout()) {
//!         let finding = probe.run(&target, &resolver).await;
//!         println!("{}: {}", finding.name, finding.status);
//!     }
//!     Ok(())
//! }
//! ```

mod cname;
mod mx;
mod nameserver;
mod txt_policy;
mod wildcard;
mod zone_transfer;

pub use cname::{CnameTakeoverProbe, TAKEOVER_CANDIDATES};
pub use mx::MxProbe;
pub use nameserver::NameserverHealthProbe;
pub use txt_policy::TxtPolicyProbe;
pub use wildcard::WildcardProbe;
pub use zone_transfer::ZoneTransferProbe;

use crate::model::{Finding, ScanTarget, Severity, Status};
use crate::resolver::DnsResolver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identifier of each probe in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Axfr,
    Spf,
    Dmarc,
    Wildcard,
    Mx,
    Cname,
    Ns,
}

impl ProbeKind {
    /// All probes in the order a scan runs and reports them.
    pub const ORDER: [ProbeKind; 7] = [
        ProbeKind::Axfr,
        ProbeKind::Spf,
        ProbeKind::Dmarc,
        ProbeKind::Wildcard,
        ProbeKind::Mx,
        ProbeKind::Cname,
        ProbeKind::Ns,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Axfr => "axfr",
            ProbeKind::Spf => "spf",
            ProbeKind::Dmarc => "dmarc",
            ProbeKind::Wildcard => "wildcard",
            ProbeKind::Mx => "mx",
            ProbeKind::Cname => "cname",
            ProbeKind::Ns => "ns",
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One independent DNS check.
///
/// Implementors must not fail: every query error is folded into the
/// returned [`Finding`].
#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Returns the stable, human-readable name reported in findings.
    fn name(&self) -> &'static str;

    /// Returns a one-line explanation of what is checked.
    fn description(&self) -> &'static str;

    /// Returns the fixed severity of this probe.
    fn severity(&self) -> Severity;

    /// Starts a finding for this probe with the given status and no details.
    fn finding(&self, status: Status) -> Finding {
        Finding::new(self.name(), self.description(), status, self.severity())
    }

    /// Runs the check against `target` using `resolver`.
    async fn run(&self, target: &ScanTarget, resolver: &dyn DnsResolver) -> Finding;
}

/// Returns the full probe set in declared order.
///
/// # Example
///
/// ```
/// use dnsposture::probe::all_probes;
/// use std::time::Duration;
///
/// let probes = all_probes(Duration::from_secs(5));
/// assert_eq!(probes.len(), 7);
/// assert_eq!(probes[0].name(), "Zone Transfer (AXFR)");
/// ```
pub fn all_probes(transfer_timeout: Duration) -> Vec<Box<dyn Probe>> {
    ProbeKind::ORDER
        .iter()
        .map(|kind| get_probe(*kind, transfer_timeout))
        .collect()
}

/// Returns the probe for a specific kind.
pub fn get_probe(kind: ProbeKind, transfer_timeout: Duration) -> Box<dyn Probe> {
    match kind {
        ProbeKind::Axfr => Box::new(ZoneTransferProbe::new(transfer_timeout)),
        ProbeKind::Spf => Box::new(TxtPolicyProbe::spf()),
        ProbeKind::Dmarc => Box::new(TxtPolicyProbe::dmarc()),
        ProbeKind::Wildcard => Box::new(WildcardProbe),
        ProbeKind::Mx => Box::new(MxProbe),
        ProbeKind::Cname => Box::new(CnameTakeoverProbe),
        ProbeKind::Ns => Box::new(NameserverHealthProbe),
    }
}
