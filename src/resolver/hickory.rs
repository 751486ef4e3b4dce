use super::{fqdn, relative, transfer, DnsResolver, Record, RecordType, ZoneRecord};
use crate::error::{DnsError, ScanError};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::error::ProtoErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::{RData, RecordType as WireType};
use hickory_resolver::TokioAsyncResolver;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

/// Timeouts and transport parameters for the production resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Port queried when the nameserver address does not carry one.
    ///
    /// Default: 53
    pub port: u16,

    /// Time to wait for a single query response, in seconds.
    ///
    /// Default: 3
    pub timeout_secs: u64,

    /// Upper bound on a whole lookup including retries, in seconds.
    ///
    /// Default: 6
    pub lifetime_secs: u64,

    /// Number of times a query is sent before giving up.
    ///
    /// Default: 2
    pub attempts: usize,

    /// Upper bound on one zone transfer attempt, in seconds.
    ///
    /// Default: 5
    pub zone_transfer_timeout_secs: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            port: 53,
            timeout_secs: 3,
            lifetime_secs: 6,
            attempts: 2,
            zone_transfer_timeout_secs: 5,
        }
    }
}

impl ResolverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    pub fn zone_transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.zone_transfer_timeout_secs)
    }

    fn resolver_opts(&self) -> ResolverOpts {
        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout();
        opts.attempts = self.attempts.max(1);
        opts.use_hosts_file = false;
        opts.edns0 = true;
        opts.cache_size = 0;
        opts
    }
}

/// Production resolver pinned to a single nameserver address.
///
/// The system resolver configuration and hosts file are never consulted, and
/// answers are not cached, so every query reaches the server.
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
    server: SocketAddr,
    lifetime: Duration,
}

impl HickoryResolver {
    /// Creates a resolver that sends every query to `nameserver`.
    ///
    /// `nameserver` is an IP address, optionally with a port
    /// (`192.0.2.53:5353`, `[2001:db8::53]:53`).
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidNameserver`] if the address cannot be parsed.
    pub fn new(nameserver: &str, settings: &ResolverSettings) -> Result<Self, ScanError> {
        let server = parse_nameserver(nameserver, settings.port)?;

        let group = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], group);
        let resolver = TokioAsyncResolver::tokio(config, settings.resolver_opts());

        debug!(%server, timeout = settings.timeout_secs, lifetime = settings.lifetime_secs, "Resolver pinned");

        Ok(Self {
            resolver,
            server,
            lifetime: settings.lifetime(),
        })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn resolve(&self, name: &str, record_type: RecordType) -> Result<Vec<Record>, DnsError> {
        let lookup = tokio::time::timeout(
            self.lifetime,
            self.resolver.lookup(fqdn(name), wire_type(record_type)),
        )
        .await
        .map_err(|_| DnsError::Timeout)?
        .map_err(|e| classify(name, &e))?;

        let records: Vec<Record> = lookup.iter().filter_map(convert).collect();
        debug!(name, %record_type, count = records.len(), "Lookup answered");

        if records.is_empty() {
            return Err(DnsError::NoAnswer {
                name: name.to_string(),
            });
        }
        Ok(records)
    }

    async fn transfer_zone(&self, domain: &str, timeout: Duration) -> Result<Vec<ZoneRecord>, DnsError> {
        transfer::axfr(self.server, domain, timeout).await
    }
}

fn parse_nameserver(nameserver: &str, default_port: u16) -> Result<SocketAddr, ScanError> {
    let nameserver = nameserver.trim();
    if let Ok(ip) = nameserver.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    nameserver
        .parse::<SocketAddr>()
        .map_err(|_| ScanError::InvalidNameserver(nameserver.to_string()))
}

fn wire_type(record_type: RecordType) -> WireType {
    match record_type {
        RecordType::A => WireType::A,
        RecordType::Ns => WireType::NS,
        RecordType::Mx => WireType::MX,
        RecordType::Txt => WireType::TXT,
        RecordType::Cname => WireType::CNAME,
    }
}

/// Converts answer data, skipping types the probes never ask for
/// (e.g. the CNAME chain preceding an A answer).
fn convert(rdata: &RData) -> Option<Record> {
    match rdata {
        RData::A(a) => Some(Record::A(a.0)),
        RData::NS(ns) => Some(Record::Ns(relative(&ns.0.to_string()))),
        RData::MX(mx) => Some(Record::Mx {
            preference: mx.preference(),
            exchange: relative(&mx.exchange().to_string()),
        }),
        RData::TXT(txt) => Some(Record::Txt(txt.txt_data().concat())),
        RData::CNAME(cname) => Some(Record::Cname(relative(&cname.0.to_string()))),
        _ => None,
    }
}

fn classify(name: &str, error: &ResolveError) -> DnsError {
    match error.kind() {
        ResolveErrorKind::Timeout => DnsError::Timeout,
        ResolveErrorKind::NoRecordsFound { response_code, .. } => from_response_code(name, *response_code),
        ResolveErrorKind::Proto(proto) if matches!(proto.kind(), ProtoErrorKind::Timeout) => DnsError::Timeout,
        _ => DnsError::Other(error.to_string()),
    }
}

pub(super) fn from_response_code(name: &str, code: ResponseCode) -> DnsError {
    match code {
        ResponseCode::NXDomain => DnsError::NameError {
            name: name.to_string(),
        },
        ResponseCode::NoError => DnsError::NoAnswer {
            name: name.to_string(),
        },
        ResponseCode::ServFail => DnsError::ServerFailure,
        ResponseCode::Refused | ResponseCode::NotAuth => DnsError::Refused,
        other => DnsError::Other(format!("The nameserver answered {}", other)),
    }
}
