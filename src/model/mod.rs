//! Core data types for findings, reports, and scan targets.
//!
//! This module contains the fundamental types used throughout dnsposture:
//!
//! - [`Finding`] - The outcome of one probe
//! - [`Status`] - Pass/fail classification of a finding
//! - [`Severity`] - Fixed weight of a probe
//! - [`Report`] - Complete scan results
//! - [`Stats`] - Aggregate counts and score over a report
//! - [`ScanTarget`] - The validated domain and nameserver pair
//!
//! # Example
//!
//! ```
//! use dnsposture::{Finding, Report, ScanTarget, Severity, Status};
//!
//! let target = ScanTarget::new("example.test", "127.0.0.1").unwrap();
//! let finding = Finding::new("SPF Record", "Sender Policy Framework configuration", Status::Safe, Severity::Medium)
//!     .with_detail("SPF record found: v=spf1 -all");
//! let report = Report::new(&target, chrono::Utc::now(), vec![finding]);
//!
//! assert_eq!(report.stats().score, 100);
//! ```

mod finding;
mod report;

pub use finding::*;
pub use report::*;

use crate::error::ScanError;
use serde::{Deserialize, Serialize};

/// Nameserver used when the caller does not name one.
pub const DEFAULT_NAMESERVER: &str = "127.0.0.1";

/// The domain and nameserver a scan is pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget {
    pub domain: String,
    pub nameserver: String,
}

impl ScanTarget {
    /// Validates and normalizes a scan target.
    ///
    /// Both values are trimmed. An empty domain is rejected; an empty
    /// nameserver falls back to [`DEFAULT_NAMESERVER`].
    pub fn new(domain: impl AsRef<str>, nameserver: impl AsRef<str>) -> Result<Self, ScanError> {
        let domain = domain.as_ref().trim();
        if domain.is_empty() {
            return Err(ScanError::EmptyDomain);
        }

        let nameserver = match nameserver.as_ref().trim() {
            "" => DEFAULT_NAMESERVER,
            ns => ns,
        };

        Ok(Self {
            domain: domain.to_string(),
            nameserver: nameserver.to_string(),
        })
    }

    /// Builds `<label>.<domain>`.
    pub fn subdomain(&self, label: &str) -> String {
        format!("{}.{}", label, self.domain)
    }
}

impl std::fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} via {}", self.domain, self.nameserver)
    }
}
