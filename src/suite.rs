//! Check suites loaded from TOML
//!
//! A suite lists families to check, optionally with custom parameter
//! domains (by standard domain name) and configuration overrides:
//!
//! ```toml
//! [[check]]
//! family = "normal"
//! size = 2000
//! [check.params]
//! mu = "R"
//! sd = "Rplus"
//!
//! [[check]]
//! family = "poisson"
//! ```
//!
//! Parameters a check leaves out keep the family's default domain.

use crate::catalog::{default_config, default_domains, parse_domain};
use crate::distributions::Family;
use crate::equivalence::{ConfigOverrides, EquivalenceConfig};
use crate::grid::DomainMap;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CheckEntry {
    family: String,
    #[serde(default)]
    params: BTreeMap<String, String>,
    alpha: Option<f64>,
    size: Option<usize>,
    fails: Option<usize>,
    points: Option<usize>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    #[serde(default)]
    check: Vec<CheckEntry>,
}

/// One resolved suite entry
#[derive(Debug, Clone)]
pub struct SuiteCheck {
    pub family: Family,
    pub domains: DomainMap,
    pub overrides: ConfigOverrides,
}

impl SuiteCheck {
    /// Family defaults, then this check's overrides, then `global`
    pub fn config(&self, global: &ConfigOverrides) -> EquivalenceConfig {
        global.apply(self.overrides.apply(default_config(self.family)))
    }
}

/// Ordered list of checks
#[derive(Debug, Clone, Default)]
pub struct Suite {
    checks: Vec<SuiteCheck>,
}

impl Suite {
    /// Load a suite from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, names an
    /// unknown family, parameter or domain.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read suite file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid suite file: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SuiteFile =
            toml::from_str(content).context("Failed to parse TOML suite definition")?;

        let mut checks = Vec::with_capacity(file.check.len());
        for (i, entry) in file.check.into_iter().enumerate() {
            let check = resolve(entry).with_context(|| format!("In check #{}", i + 1))?;
            checks.push(check);
        }
        Ok(Self { checks })
    }

    /// Suite of every family with its default domains
    pub fn all_families() -> Self {
        Self::from_families(Family::ALL)
    }

    pub fn from_families<I: IntoIterator<Item = Family>>(families: I) -> Self {
        Self {
            checks: families
                .into_iter()
                .map(|family| SuiteCheck {
                    family,
                    domains: default_domains(family),
                    overrides: ConfigOverrides::default(),
                })
                .collect(),
        }
    }

    pub fn checks(&self) -> &[SuiteCheck] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn extend(&mut self, other: Suite) {
        self.checks.extend(other.checks);
    }
}

fn resolve(entry: CheckEntry) -> Result<SuiteCheck> {
    let family: Family = entry.family.parse()?;

    let mut domains = default_domains(family);
    for (name, domain_name) in &entry.params {
        let slot = domains
            .iter_mut()
            .find(|(declared, _)| declared == name)
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown parameter '{}' for family {}", name, family)
            })?;
        slot.1 = parse_domain(domain_name)
            .map_err(|e| anyhow::anyhow!("Parameter '{}': {}", name, e))?;
    }

    let overrides = ConfigOverrides {
        alpha: entry.alpha,
        size: entry.size,
        fails: entry.fails,
        points: entry.points,
        seed: entry.seed,
    };
    overrides
        .apply(default_config(family))
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration for {}: {}", family, e))?;

    Ok(SuiteCheck {
        family,
        domains,
        overrides,
    })
}
