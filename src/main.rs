use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use dnsposture::{
    config::Config,
    model::{Report, ScanTarget, Severity},
    output::{format_report_to_string, print_report, OutputFormat},
    probe::all_probes,
    run_scan,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const CRITICAL_FINDING: u8 = 2;
    pub const HIGH_FINDING: u8 = 3;
    pub const MEDIUM_FINDING: u8 = 4;
    pub const LOW_FINDING: u8 = 5;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "dnsposture")]
#[command(
    author,
    version,
    about = "Scan a domain's nameserver for DNS security misconfigurations"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a domain against a nameserver
    Scan {
        /// Domain to scan
        domain: String,

        /// Nameserver address to query (IP, optionally with port)
        #[arg(short, long)]
        nameserver: Option<String>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Run probes concurrently
        #[arg(long)]
        parallel: bool,

        /// Exit with error if a non-safe finding at or above this severity exists
        #[arg(long, value_enum)]
        fail_on: Option<FailLevel>,
    },

    /// List the probes a scan runs, in order
    ListProbes,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FailLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl FailLevel {
    fn threshold(self) -> Severity {
        match self {
            FailLevel::Critical => Severity::Critical,
            FailLevel::High => Severity::High,
            FailLevel::Medium => Severity::Medium,
            FailLevel::Low => Severity::Low,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dnsposture=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dnsposture=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config file");
        Config::default()
    });

    match cli.command {
        Commands::Scan {
            domain,
            nameserver,
            format,
            output,
            parallel,
            fail_on,
        } => {
            let mut config = config;
            if parallel {
                config.parallel = true;
            }
            let nameserver = nameserver.unwrap_or_else(|| config.nameserver.clone());
            let format_str = format.unwrap_or_else(|| config.default_format.clone());

            scan(&domain, &nameserver, &config, format_str, output, fail_on).await
        }
        Commands::ListProbes => {
            list_probes(&config);
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn scan(
    domain: &str,
    nameserver: &str,
    config: &Config,
    format: String,
    output_file: Option<String>,
    fail_on: Option<FailLevel>,
) -> Result<u8> {
    let format = OutputFormat::from_str(&format).map_err(|e| anyhow::anyhow!(e))?;
    let target = ScanTarget::new(domain, nameserver)?;
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Scanning {}...", target));
        Some(pb)
    } else {
        None
    };

    let result = run_scan(&target.domain, &target.nameserver, config).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = result?;

    if let Some(path) = output_file {
        let content = format_report_to_string(&report, format)?;
        std::fs::write(&path, content)?;
        eprintln!("Report written to: {}", path);
    } else {
        print_report(&report, format)?;
    }

    Ok(determine_exit_code(&report, fail_on))
}

/// Determine the exit code based on findings and --fail-on setting
fn determine_exit_code(report: &Report, fail_on: Option<FailLevel>) -> u8 {
    let Some(fail_on) = fail_on else {
        return exit_codes::SUCCESS;
    };

    match report.highest_failing_severity() {
        Some(worst) if worst >= fail_on.threshold() => match worst {
            Severity::Critical => exit_codes::CRITICAL_FINDING,
            Severity::High => exit_codes::HIGH_FINDING,
            Severity::Medium => exit_codes::MEDIUM_FINDING,
            Severity::Low => exit_codes::LOW_FINDING,
        },
        _ => exit_codes::SUCCESS,
    }
}

fn list_probes(config: &Config) {
    println!("Probes (in scan order):");
    println!();

    for probe in all_probes(config.resolver.zone_transfer_timeout()) {
        println!("  {:<10} {:<24} [severity: {}]", probe.kind().as_str(), probe.name(), probe.severity());
        println!("  {:<10} {}", "", probe.description());
        println!();
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'dnsposture config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
