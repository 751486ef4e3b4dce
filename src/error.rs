//! Error types for scan setup and DNS queries.
//!
//! [`ScanError`] is the only error a caller of the engine ever sees; it is
//! raised before any probe runs. [`DnsError`] is the classified failure of a
//! single query and never crosses a probe boundary.

use thiserror::Error;

/// Errors that prevent a scan from starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Domain is required")]
    EmptyDomain,

    #[error("Invalid nameserver address: {0}")]
    InvalidNameserver(String),
}

/// Classified failure of a single DNS query or zone transfer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("The DNS operation timed out")]
    Timeout,

    #[error("The DNS query name does not exist: {name}")]
    NameError { name: String },

    #[error("The DNS response does not contain an answer to the question: {name}")]
    NoAnswer { name: String },

    #[error("The nameserver reported a server failure")]
    ServerFailure,

    #[error("The nameserver refused the request")]
    Refused,

    #[error("{0}")]
    Other(String),
}

impl DnsError {
    /// Returns true when the failure says nothing about whether the data exists.
    ///
    /// `NameError` and `NoAnswer` are authoritative statements of absence;
    /// everything else means the question went unanswered.
    pub fn is_inconclusive(&self) -> bool {
        !matches!(self, DnsError::NameError { .. } | DnsError::NoAnswer { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DnsError::Timeout => "timeout",
            DnsError::NameError { .. } => "nxdomain",
            DnsError::NoAnswer { .. } => "no-answer",
            DnsError::ServerFailure => "servfail",
            DnsError::Refused => "refused",
            DnsError::Other(_) => "other",
        }
    }
}
