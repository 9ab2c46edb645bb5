//! CLI argument parsing for distcheck

use crate::distributions::Family;
use crate::equivalence::ConfigOverrides;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for check reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "distcheck")]
#[command(version)]
#[command(
    about = "Statistical equivalence checks for random samplers",
    long_about = None
)]
pub struct Cli {
    /// Family to check (repeatable, e.g. -f normal -f poisson)
    #[arg(short = 'f', long = "family", value_name = "NAME")]
    pub families: Vec<Family>,

    /// Check every supported family
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Load checks from a TOML suite file
    #[arg(short = 's', long = "suite", value_name = "FILE")]
    pub suite: Option<PathBuf>,

    /// Significance level; a draw fails when its p-value is <= ALPHA
    #[arg(long = "alpha", value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Samples drawn from each side per attempt
    #[arg(short = 'n', long = "size", value_name = "N")]
    pub size: Option<usize>,

    /// Retries allowed after a failing draw
    #[arg(long = "fails", value_name = "F")]
    pub fails: Option<usize>,

    /// Target number of grid points per family
    #[arg(long = "points", value_name = "P")]
    pub points: Option<usize>,

    /// Seed for reproducible grids and samplers
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// List supported families and exit
    #[arg(long = "list")]
    pub list: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Configuration flags given on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            alpha: self.alpha,
            size: self.size,
            fails: self.fails,
            points: self.points,
            seed: self.seed,
        }
    }

    /// Whether any checks were requested
    pub fn has_selection(&self) -> bool {
        self.all || self.suite.is_some() || !self.families.is_empty()
    }
}
