//! Built-in equivalence checks for every supported family
//!
//! Each family has default parameter domains and a default configuration.
//! A check pairs the crate's own sampler ([`Candidate`]) with the
//! `rand_distr` one ([`Reference`]) and runs the matching tester.

use crate::distributions::{Family, RandomVariable, SamplerError};
use crate::domain::{self, Domain, ParamValue};
use crate::equivalence::{
    check_continuous, check_discrete, CandidateSampler, EquivalenceConfig, EquivalenceError,
    EquivalenceReport, SampleSet,
};
use crate::grid::{domains, DomainMap, ParameterPoint};
use crate::reference::Reference;
use crate::shape::Size;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Candidate sampler drawing from [`RandomVariable`]
#[derive(Debug, Clone)]
pub struct Candidate {
    family: Family,
    rng: StdRng,
}

impl Candidate {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(family: Family, seed: u64) -> Self {
        Self {
            family,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl CandidateSampler for Candidate {
    fn sample(&mut self, point: &ParameterPoint, size: usize) -> Result<SampleSet, SamplerError> {
        let rv = RandomVariable::from_point(self.family, point)?;
        Ok(rv.random(&Size::Length(size), &mut self.rng)?.into_values())
    }
}

/// Default parameter domains for `family`
pub fn default_domains(family: Family) -> DomainMap {
    match family {
        Family::Normal | Family::LogitNormal => {
            domains([("mu", domain::r()), ("sd", domain::rplus())])
        }
        // Infinite bounds give the lower-only and upper-only forms
        Family::TruncatedNormal => domains([
            ("mu", domain::r()),
            ("sd", domain::rplusbig()),
            ("lower", with_infinite(-domain::rplusbig())),
            ("upper", with_infinite(domain::rplusbig())),
        ]),
        Family::SkewNormal => domains([
            ("mu", domain::r()),
            ("sd", domain::rplus()),
            ("alpha", domain::r()),
        ]),
        Family::GammaMuSd => domains([("mu", domain::rplusbig()), ("sd", domain::rplusunif())]),
        Family::Kumaraswamy => domains([("a", domain::rplusbig()), ("b", domain::rplusbig())]),
        Family::Wald => domains([
            ("mu", domain::rplusbig()),
            ("lam", domain::rplusbig()),
            ("alpha", domain::rplus()),
        ]),
        Family::VonMises => domains([("mu", domain::r()), ("kappa", domain::rplus())]),
        Family::Uniform => domains([("lower", -domain::rplus()), ("upper", domain::rplus())]),
        Family::HalfNormal => domains([("tau", domain::rplus())]),
        Family::Exponential => domains([("lam", domain::rplus())]),
        Family::Laplace => domains([("mu", domain::r()), ("b", domain::rplus())]),
        Family::Lognormal => domains([("mu", domain::r()), ("tau", domain::rplusbig())]),
        Family::StudentT => domains([
            ("nu", domain::rplusbig()),
            ("mu", domain::r()),
            ("lam", domain::rplus()),
        ]),
        Family::Cauchy => domains([("alpha", domain::r()), ("beta", domain::rplusbig())]),
        Family::HalfCauchy => domains([("beta", domain::rplusbig())]),
        Family::Gamma
        | Family::InverseGamma
        | Family::Beta
        | Family::Weibull => domains([("alpha", domain::rplusbig()), ("beta", domain::rplusbig())]),
        Family::ChiSquared => domains([("nu", domain::rplusbig())]),
        Family::Pareto => domains([("alpha", domain::rplusbig()), ("m", domain::rplusbig())]),
        Family::Gumbel => domains([("mu", domain::r()), ("beta", domain::rplus())]),
        Family::Logistic => domains([("mu", domain::r()), ("s", domain::rplus())]),
        // Every mode lies strictly inside every (lower, upper) pair
        Family::Triangular => domains([
            ("lower", -domain::rplusbig()),
            ("c", domain::runif()),
            ("upper", domain::rplusbig()),
        ]),
        Family::ExGaussian => domains([
            ("mu", domain::r()),
            ("sigma", domain::rplus()),
            ("nu", domain::rplus()),
        ]),
        Family::Bernoulli | Family::Geometric => domains([("p", domain::unit())]),
        Family::Binomial => domains([("n", domain::nat()), ("p", domain::unit())]),
        Family::BetaBinomial => domains([
            ("alpha", domain::rplusbig()),
            ("beta", domain::rplusbig()),
            ("n", domain::nat()),
        ]),
        Family::DiscreteWeibull => domains([("q", domain::unit()), ("beta", domain::rplusdunif())]),
        Family::Poisson => domains([("mu", domain::rplusbig())]),
        Family::NegativeBinomial => {
            domains([("mu", domain::rplusbig()), ("alpha", domain::rplusbig())])
        }
        Family::DiscreteUniform => {
            domains([("lower", -domain::nat_small()), ("upper", domain::nat_small())])
        }
        Family::Constant => domains([("c", domain::int_range())]),
        Family::ZeroInflatedPoisson => {
            domains([("psi", domain::unit()), ("theta", domain::rplusbig())])
        }
        Family::ZeroInflatedNegativeBinomial => domains([
            ("psi", domain::unit()),
            ("mu", domain::rplusbig()),
            ("alpha", domain::rplusbig()),
        ]),
        Family::ZeroInflatedBinomial => domains([
            ("psi", domain::unit()),
            ("n", domain::nat()),
            ("p", domain::unit()),
        ]),
        Family::Categorical => domains([("p", domain::simplex(3))]),
    }
}

/// `domain` with its outer edge added as a test value
fn with_infinite(domain: Domain) -> Domain {
    let mut values = domain.values().to_vec();
    let edge = match domain.lower() {
        ParamValue::Real(v) if v.is_infinite() => domain.lower().clone(),
        _ => domain.upper().clone(),
    };
    values.push(edge);
    Domain::with_edges(values, domain.lower().clone(), domain.upper().clone())
}

/// Default configuration for `family`
///
/// Continuous families use [`EquivalenceConfig::continuous`], discrete ones
/// [`EquivalenceConfig::discrete`]. Families whose frequency tables are
/// long-tailed use smaller samples with a larger retry budget.
pub fn default_config(family: Family) -> EquivalenceConfig {
    match family {
        Family::Poisson => EquivalenceConfig::discrete().with_size(500),
        Family::NegativeBinomial | Family::ZeroInflatedNegativeBinomial => {
            EquivalenceConfig::discrete().with_size(100).with_fails(50)
        }
        Family::Geometric => EquivalenceConfig::discrete().with_size(500).with_fails(50),
        f if f.is_discrete() => EquivalenceConfig::discrete(),
        _ => EquivalenceConfig::continuous(),
    }
}

/// Parse a domain by its standard name, reporting unknown names
pub fn parse_domain(name: &str) -> Result<Domain, String> {
    Domain::named(name).ok_or_else(|| format!("unknown domain '{}'", name))
}

/// Check `family`'s sampler against its reference over `domains`
///
/// With a seed in `config`, the grid, candidate and reference RNGs are all
/// derived from it and the whole check is reproducible.
pub fn run_check(
    family: Family,
    domains: DomainMap,
    config: &EquivalenceConfig,
) -> Result<EquivalenceReport, EquivalenceError> {
    let (mut candidate, mut reference) = match config.seed {
        Some(seed) => (
            Candidate::seeded(family, seed.wrapping_add(1)),
            Reference::seeded(family, seed.wrapping_add(2)),
        ),
        None => (Candidate::new(family), Reference::new(family)),
    };

    tracing::info!(
        "Checking {} over {} parameter(s)",
        family,
        domains.len()
    );

    let mut report = if family.is_discrete() {
        check_discrete(&mut candidate, &mut reference, domains, config)?
    } else {
        check_continuous(&mut candidate, &mut reference, domains, config)?
    };
    report.name = family.name().to_string();
    Ok(report)
}

/// Check `family` with its default domains and configuration
pub fn run_default(family: Family) -> Result<EquivalenceReport, EquivalenceError> {
    run_check(family, default_domains(family), &default_config(family))
}
