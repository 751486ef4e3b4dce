pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod probe;
pub mod resolver;
pub mod scan;

pub use config::Config;
pub use error::{DnsError, ScanError};
pub use model::{Finding, Report, ScanTarget, Severity, Stats, Status};
pub use probe::Probe;
pub use resolver::DnsResolver;
pub use scan::{run_scan, ScanOptions, Scanner};
