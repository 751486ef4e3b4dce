use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::{Finding, ScanTarget, Severity, Status};

/// Aggregate counts over a report's findings.
///
/// `missing` and `error` findings count toward `total` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Stats {
    pub total: usize,
    pub vulnerable: usize,
    pub warning: usize,
    pub safe: usize,
    pub score: u32,
}

impl Stats {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let count = |status: Status| findings.iter().filter(|f| f.status == status).count();

        let total = findings.len();
        let safe = count(Status::Safe);
        let score = if total > 0 { (100 * safe / total) as u32 } else { 0 };

        Self {
            total,
            vulnerable: count(Status::Vulnerable),
            warning: count(Status::Warning),
            safe,
            score,
        }
    }
}

/// Complete result of one scan.
///
/// Findings appear in the order the probes were declared. Stats are always
/// derived from the findings and are never stored.
#[derive(Debug, Clone)]
pub struct Report {
    pub domain: String,
    pub nameserver: String,
    pub timestamp: DateTime<Utc>,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn new(target: &ScanTarget, timestamp: DateTime<Utc>, findings: Vec<Finding>) -> Self {
        Self {
            domain: target.domain.clone(),
            nameserver: target.nameserver.clone(),
            timestamp,
            findings,
        }
    }

    pub fn stats(&self) -> Stats {
        Stats::from_findings(&self.findings)
    }

    /// Highest severity among findings that are not `safe`.
    pub fn highest_failing_severity(&self) -> Option<Severity> {
        self.findings
            .iter()
            .filter(|f| f.status.is_failing())
            .map(|f| f.severity)
            .max()
    }

    pub fn finding(&self, name: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.name == name)
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Report", 5)?;
        state.serialize_field("domain", &self.domain)?;
        state.serialize_field("nameserver", &self.nameserver)?;
        state.serialize_field("timestamp", &self.timestamp.to_rfc3339())?;
        state.serialize_field("tests", &self.findings)?;
        state.serialize_field("stats", &self.stats())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(status: Status, severity: Severity) -> Finding {
        Finding::new("probe", "description", status, severity).with_detail("detail")
    }

    fn target() -> ScanTarget {
        ScanTarget::new("example.test", "127.0.0.1").unwrap()
    }

    #[test]
    fn test_stats_empty() {
        let stats = Stats::from_findings(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.score, 0);
    }

    #[test]
    fn test_stats_buckets_exclude_missing_and_error() {
        let findings = vec![
            finding(Status::Error, Severity::Critical),
            finding(Status::Missing, Severity::Medium),
            finding(Status::Missing, Severity::Medium),
            finding(Status::Safe, Severity::Low),
            finding(Status::Warning, Severity::Medium),
            finding(Status::Safe, Severity::High),
            finding(Status::Vulnerable, Severity::High),
        ];
        let stats = Stats::from_findings(&findings);

        assert_eq!(stats.total, 7);
        assert_eq!(stats.safe, 2);
        assert_eq!(stats.warning, 1);
        assert_eq!(stats.vulnerable, 1);
        assert!(stats.safe + stats.warning + stats.vulnerable <= stats.total);
        // 200 / 7 = 28.57
        assert_eq!(stats.score, 28);
    }

    #[test]
    fn test_score_floors() {
        let findings = vec![
            finding(Status::Safe, Severity::Low),
            finding(Status::Safe, Severity::Low),
            finding(Status::Warning, Severity::Low),
        ];
        assert_eq!(Stats::from_findings(&findings).score, 66);

        let all_safe = vec![finding(Status::Safe, Severity::Low); 7];
        assert_eq!(Stats::from_findings(&all_safe).score, 100);
    }

    #[test]
    fn test_highest_failing_severity_ignores_safe() {
        let report = Report::new(
            &target(),
            Utc::now(),
            vec![
                finding(Status::Safe, Severity::Critical),
                finding(Status::Missing, Severity::Medium),
                finding(Status::Warning, Severity::Low),
            ],
        );
        assert_eq!(report.highest_failing_severity(), Some(Severity::Medium));

        let clean = Report::new(&target(), Utc::now(), vec![finding(Status::Safe, Severity::High)]);
        assert_eq!(clean.highest_failing_severity(), None);
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = Report::new(
            &target(),
            Utc::now(),
            vec![finding(Status::Safe, Severity::Low), finding(Status::Error, Severity::High)],
        );
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["domain"], "example.test");
        assert_eq!(value["nameserver"], "127.0.0.1");
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
        assert_eq!(value["tests"].as_array().unwrap().len(), 2);
        assert_eq!(value["stats"]["total"], 2);
        assert_eq!(value["stats"]["safe"], 1);
        assert_eq!(value["stats"]["score"], 50);
    }
}
