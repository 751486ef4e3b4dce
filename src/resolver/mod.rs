//! DNS resolution contract consumed by the probes.
//!
//! Probes never talk to the network directly. They go through a
//! [`DnsResolver`], which answers typed queries or fails with a classified
//! [`DnsError`](crate::DnsError). Two implementations ship with the crate:
//!
//! | Resolver | Use |
//! |----------|-----|
//! | [`HickoryResolver`] | Real queries pinned to one nameserver address |
//! | [`MockResolver`] | Canned answers for tests |

mod hickory;
mod mock;
mod transfer;

pub use hickory::{HickoryResolver, ResolverSettings};
pub use mock::MockResolver;

use crate::error::DnsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Record types the probes ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    A,
    Ns,
    Mx,
    Txt,
    Cname,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Ns => "NS",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Cname => "CNAME",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed answer record. Host names carry no trailing root dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    A(Ipv4Addr),
    Ns(String),
    Mx { preference: u16, exchange: String },
    /// Character-strings of one TXT record, concatenated.
    Txt(Vec<u8>),
    Cname(String),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::A(_) => RecordType::A,
            Record::Ns(_) => RecordType::Ns,
            Record::Mx { .. } => RecordType::Mx,
            Record::Txt(_) => RecordType::Txt,
            Record::Cname(_) => RecordType::Cname,
        }
    }

    /// Target host name for NS and CNAME records.
    pub fn target(&self) -> Option<&str> {
        match self {
            Record::Ns(name) | Record::Cname(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Record::A(addr) => write!(f, "{}", addr),
            Record::Ns(name) | Record::Cname(name) => write!(f, "{}", name),
            Record::Mx { preference, exchange } => write!(f, "{} {}", preference, exchange),
            Record::Txt(data) => write!(f, "{}", String::from_utf8_lossy(data)),
        }
    }
}

/// One record received through a zone transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub name: String,
    pub record_type: String,
    pub data: String,
}

/// Answers DNS questions against the nameserver a scan is pinned to.
///
/// A successful `resolve` is never empty; an empty answer section is
/// reported as [`DnsError::NoAnswer`].
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Resolves `name` for the given record type.
    async fn resolve(&self, name: &str, record_type: RecordType) -> Result<Vec<Record>, DnsError>;

    /// Requests a full zone transfer (AXFR) of `domain`.
    ///
    /// Returns the transferred records without the closing SOA.
    async fn transfer_zone(&self, domain: &str, timeout: Duration) -> Result<Vec<ZoneRecord>, DnsError>;
}

/// Resolves the NS host names of `domain`, or nothing when the lookup fails.
pub async fn nameservers(resolver: &dyn DnsResolver, domain: &str) -> Vec<String> {
    match resolver.resolve(domain, RecordType::Ns).await {
        Ok(records) => records
            .iter()
            .filter_map(|r| r.target().map(str::to_string))
            .collect(),
        Err(e) => {
            if e.is_inconclusive() {
                tracing::warn!(domain, kind = e.kind(), error = %e, "NS lookup inconclusive");
            } else {
                tracing::debug!(domain, kind = e.kind(), "No NS records");
            }
            Vec::new()
        }
    }
}

/// Appends the root label if missing.
pub(crate) fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Strips the root label.
pub(crate) fn relative(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}
