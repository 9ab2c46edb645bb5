use anyhow::Result;
use clap::Parser;
use distcheck::catalog::{default_config, default_domains, run_check};
use distcheck::cli::{Cli, OutputFormat};
use distcheck::distributions::Family;
use distcheck::equivalence::{failure_report_string, EquivalenceReport};
use distcheck::suite::Suite;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Outcome of one family's check, as emitted by `--format json`
#[derive(Debug, Serialize)]
struct CheckRecord {
    family: String,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<EquivalenceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Print supported families with their parameters and default domains
fn print_families() {
    for family in Family::ALL {
        let config = default_config(family);
        let kind = if family.is_discrete() {
            "discrete"
        } else {
            "continuous"
        };
        let params: Vec<String> = default_domains(family)
            .iter()
            .map(|(name, domain)| format!("{} ({} values)", name, domain.len()))
            .collect();
        println!(
            "{:<22} {:<10} size={:<6} fails={:<2} {}",
            family.name(),
            kind,
            config.size,
            config.fails,
            params.join(", ")
        );
    }
}

/// Collect checks from --suite, --all and --family, in that order
fn build_suite(args: &Cli) -> Result<Suite> {
    if !args.has_selection() {
        anyhow::bail!(
            "Nothing to check. Usage: distcheck --family NAME, distcheck --all or distcheck --suite FILE"
        );
    }

    let mut suite = match &args.suite {
        Some(path) => Suite::from_file(path)?,
        None => Suite::default(),
    };
    if args.all {
        suite.extend(Suite::all_families());
    }
    suite.extend(Suite::from_families(args.families.iter().copied()));
    Ok(suite)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    if args.list {
        print_families();
        return Ok(());
    }

    let suite = build_suite(&args)?;
    let overrides = args.overrides();

    let mut records = Vec::with_capacity(suite.len());
    for check in suite.checks() {
        let config = check.config(&overrides);
        let name = check.family.name();

        let record = match run_check(check.family, check.domains.clone(), &config) {
            Ok(report) => {
                if args.format == OutputFormat::Text {
                    println!("{}", report.to_report_string());
                }
                CheckRecord {
                    family: name.to_string(),
                    passed: true,
                    report: Some(report),
                    error: None,
                }
            }
            Err(err) => {
                if args.format == OutputFormat::Text {
                    println!("{}", failure_report_string(name, &err));
                }
                CheckRecord {
                    family: name.to_string(),
                    passed: false,
                    report: None,
                    error: Some(err.to_string()),
                }
            }
        };
        records.push(record);
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    let failed: Vec<&str> = records
        .iter()
        .filter(|r| !r.passed)
        .map(|r| r.family.as_str())
        .collect();
    if !failed.is_empty() {
        anyhow::bail!(
            "{} of {} checks failed: {}",
            failed.len(),
            records.len(),
            failed.join(", ")
        );
    }

    Ok(())
}
