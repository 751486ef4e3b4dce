use serde::{Deserialize, Serialize};

/// Outcome classification of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Safe,
    Warning,
    Vulnerable,
    Missing,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Safe => "safe",
            Status::Warning => "warning",
            Status::Vulnerable => "vulnerable",
            Status::Missing => "missing",
            Status::Error => "error",
        }
    }

    /// Anything other than `Safe` needs operator attention.
    pub fn is_failing(&self) -> bool {
        !matches!(self, Status::Safe)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Weight of a probe. Fixed per probe, independent of its outcome.
///
/// Variants are declared from least to most severe so that `Ord` ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The result of running one probe.
///
/// `details` holds evidence lines in discovery order. Every probe path
/// appends at least one line before returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    pub description: String,
    pub status: Status,
    pub severity: Severity,
    pub details: Vec<String>,
}

impl Finding {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        status: Status,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status,
            severity,
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    pub fn push_detail(&mut self, detail: impl Into<String>) {
        self.details.push(detail.into());
    }

    /// Sets the status and appends the evidence that justified it.
    pub fn mark(&mut self, status: Status, detail: impl Into<String>) {
        self.status = status;
        self.details.push(detail.into());
    }
}
