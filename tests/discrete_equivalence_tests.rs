//! Integration tests: discrete samplers against their references
//!
//! Discrete families are checked with the chi-square tester over frequency
//! tables aligned on the union of observed values.

use distcheck::catalog::{default_config, default_domains, run_check};
use distcheck::distributions::Family;
use distcheck::domain::{self, Domain};
use distcheck::equivalence::{EquivalenceConfig, TestKind};
use distcheck::grid::domains;

fn assert_family_passes(family: Family, config: EquivalenceConfig) {
    match run_check(family, default_domains(family), &config) {
        Ok(report) => {
            assert_eq!(report.test, TestKind::ChiSquare);
            assert!(!report.outcomes.is_empty());
            for outcome in &report.outcomes {
                assert!(outcome.pvalue > config.alpha);
                assert!(outcome.draws <= config.fails + 1);
            }
        }
        Err(err) => panic!("{} failed its equivalence check: {}", family, err),
    }
}

/// Family defaults with a smaller sample and grid
fn quick_config(family: Family, seed: u64) -> EquivalenceConfig {
    let config = default_config(family).with_points(6).with_seed(seed);
    let size = config.size.min(5000);
    config.with_size(size)
}

#[test]
fn test_bernoulli() {
    assert_family_passes(Family::Bernoulli, quick_config(Family::Bernoulli, 201));
}

#[test]
fn test_binomial() {
    assert_family_passes(Family::Binomial, quick_config(Family::Binomial, 202));
}

#[test]
fn test_poisson_with_small_samples() {
    let config = quick_config(Family::Poisson, 203);
    assert_eq!(config.size, 500);
    assert_family_passes(Family::Poisson, config);
}

#[test]
fn test_negative_binomial() {
    let config = quick_config(Family::NegativeBinomial, 204);
    assert_eq!(config.fails, 50);
    assert_family_passes(Family::NegativeBinomial, config);
}

#[test]
fn test_geometric() {
    assert_family_passes(Family::Geometric, quick_config(Family::Geometric, 205));
}

#[test]
fn test_discrete_uniform() {
    assert_family_passes(
        Family::DiscreteUniform,
        quick_config(Family::DiscreteUniform, 206),
    );
}

#[test]
fn test_zero_inflated_poisson() {
    assert_family_passes(
        Family::ZeroInflatedPoisson,
        quick_config(Family::ZeroInflatedPoisson, 207),
    );
}

#[test]
fn test_zero_inflated_negative_binomial() {
    let config = quick_config(Family::ZeroInflatedNegativeBinomial, 212);
    assert_eq!(config.size, 100);
    assert_family_passes(Family::ZeroInflatedNegativeBinomial, config);
}

#[test]
fn test_zero_inflated_binomial() {
    assert_family_passes(
        Family::ZeroInflatedBinomial,
        quick_config(Family::ZeroInflatedBinomial, 213),
    );
}

#[test]
fn test_beta_binomial() {
    assert_family_passes(Family::BetaBinomial, quick_config(Family::BetaBinomial, 214));
}

#[test]
fn test_discrete_weibull() {
    assert_family_passes(
        Family::DiscreteWeibull,
        quick_config(Family::DiscreteWeibull, 215),
    );
}

/// Discrete Weibull over several integer shapes, not just the default one
#[test]
fn test_discrete_weibull_shapes() {
    let config = EquivalenceConfig::discrete()
        .with_size(500)
        .with_fails(50)
        .with_seed(216);
    let grid = domains([
        ("q", Domain::reals(&[0.0, 0.25, 0.8, 1.0])),
        ("beta", Domain::ints(&[0, 1, 2, 10, 100])),
    ]);
    let report = run_check(Family::DiscreteWeibull, grid, &config).unwrap();
    assert_eq!(report.outcomes.len(), 6);
}

#[test]
fn test_categorical() {
    assert_family_passes(Family::Categorical, quick_config(Family::Categorical, 208));
}

/// Constant samplers agree exactly, so every point short-circuits
#[test]
fn test_constant_short_circuits_at_full_size() {
    let config = default_config(Family::Constant).with_seed(209);
    assert_eq!(config.size, 100_000);

    let report = run_check(Family::Constant, default_domains(Family::Constant), &config).unwrap();
    assert_eq!(report.outcomes.len(), 7);
    for outcome in &report.outcomes {
        assert!(outcome.short_circuit);
        assert_eq!(outcome.pvalue, 1.0);
        assert_eq!(outcome.draws, 1);
    }
}

/// Poisson with rate parameters on both sides of the algorithm switch
#[test]
fn test_poisson_small_and_large_rates() {
    let config = EquivalenceConfig::discrete()
        .with_size(500)
        .with_fails(20)
        .with_seed(210);
    let grid = domains([("mu", Domain::reals(&[0.0, 0.3, 4.0, 9.5, 10.5, 40.0, 1e6]))]);
    let report = run_check(Family::Poisson, grid, &config).unwrap();
    assert_eq!(report.outcomes.len(), 5);
}

/// Binomial beyond the beta-splitting threshold
#[test]
fn test_binomial_large_n() {
    let config = EquivalenceConfig::discrete()
        .with_size(5000)
        .with_seed(211);
    let grid = domains([
        ("n", Domain::ints(&[0, 40, 500, 100_000])),
        ("p", domain::unit()),
    ]);
    let report = run_check(Family::Binomial, grid, &config).unwrap();
    assert_eq!(report.outcomes.len(), 10);
}

/// Every discrete family at its shipped configuration
///
/// Slow; run with `cargo test -- --ignored`.
#[test]
#[ignore]
fn test_every_discrete_family_at_default_config() {
    for family in Family::ALL.into_iter().filter(|f| f.is_discrete()) {
        let config = default_config(family).with_points(20).with_seed(230);
        match family {
            Family::Poisson
            | Family::NegativeBinomial
            | Family::ZeroInflatedNegativeBinomial
            | Family::Geometric => assert!(config.size < 100_000),
            _ => assert_eq!(config.size, 100_000),
        }
        if let Err(err) = run_check(family, default_domains(family), &config) {
            panic!("{} failed at its default config: {}", family, err);
        }
    }
}
