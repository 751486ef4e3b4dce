use crate::model::{Report, Severity, Status};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Check")]
    name: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Details")]
    details: String,
}

pub fn print_cli_table(report: &Report) -> Result<()> {
    println!("{}", render_table(report, true));
    Ok(())
}

/// Renders the report as a table followed by a summary.
pub fn render_table(report: &Report, color: bool) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!(
        "DNS scan of {} via {} at {}\n\n",
        report.domain,
        report.nameserver,
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let rows: Vec<FindingRow> = report
        .findings
        .iter()
        .map(|f| FindingRow {
            name: f.name.clone(),
            severity: format_severity(&f.severity, color),
            status: format_status(&f.status, color),
            details: f
                .details
                .iter()
                .map(|d| truncate(d, 90))
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect();

    out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
    out.push_str("\n\n");

    let stats = report.stats();
    out.push_str("Summary:\n");
    out.push_str(&format!("  Checks run: {}\n", stats.total));
    out.push_str(&format!(
        "  Safe: {}, Warning: {}, Vulnerable: {}, Other: {}\n",
        stats.safe,
        stats.warning,
        stats.vulnerable,
        stats.total - stats.safe - stats.warning - stats.vulnerable
    ));
    out.push('\n');
    out.push_str(&format!("Security Score: {}/100 {}\n", stats.score, score_indicator(stats.score)));
    out
}

fn format_status(status: &Status, color: bool) -> String {
    let label = status.as_str().to_uppercase();
    if !color {
        return label;
    }
    match status {
        Status::Vulnerable => format!("\x1b[31m{}\x1b[0m", label),
        Status::Warning | Status::Missing => format!("\x1b[33m{}\x1b[0m", label),
        Status::Safe => format!("\x1b[32m{}\x1b[0m", label),
        Status::Error => format!("\x1b[91m{}\x1b[0m", label),
    }
}

fn format_severity(severity: &Severity, color: bool) -> String {
    let label = severity.as_str().to_uppercase();
    if !color {
        return label;
    }
    match severity {
        Severity::Critical => format!("\x1b[31m{}\x1b[0m", label),
        Severity::High => format!("\x1b[91m{}\x1b[0m", label),
        Severity::Medium => format!("\x1b[33m{}\x1b[0m", label),
        Severity::Low => format!("\x1b[32m{}\x1b[0m", label),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn score_indicator(score: u32) -> &'static str {
    match score {
        90..=100 => "[Excellent]",
        70..=89 => "[Good]",
        50..=69 => "[Fair]",
        25..=49 => "[Poor]",
        _ => "[Critical]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Finding, ScanTarget};
    use chrono::Utc;

    fn report() -> Report {
        let target = ScanTarget::new("example.test", "127.0.0.1").unwrap();
        Report::new(
            &target,
            Utc::now(),
            vec![
                Finding::new("SPF Record", "Sender Policy Framework configuration", Status::Safe, Severity::Medium)
                    .with_detail("SPF record found: v=spf1 -all"),
                Finding::new("Wildcard DNS", "Checks for wildcard DNS records", Status::Warning, Severity::Low)
                    .with_detail("Wildcard detected: 123456.test.example.test resolved"),
                Finding::new("DMARC Record", "Domain-based Message Authentication", Status::Missing, Severity::Medium)
                    .with_detail("No DMARC record found"),
            ],
        )
    }

    #[test]
    fn test_render_table_plain() {
        let out = render_table(&report(), false);

        assert!(out.contains("DNS scan of example.test via 127.0.0.1"));
        assert!(out.contains("SPF Record"));
        assert!(out.contains("WARNING"));
        assert!(out.contains("Safe: 1, Warning: 1, Vulnerable: 0, Other: 1"));
        assert!(out.contains("Security Score: 33/100 [Poor]"));
        assert!(!out.contains("\x1b["));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer line", 10), "a much ...");
    }

    #[test]
    fn test_score_indicator() {
        assert_eq!(score_indicator(100), "[Excellent]");
        assert_eq!(score_indicator(71), "[Good]");
        assert_eq!(score_indicator(0), "[Critical]");
    }
}
