// Scenario tests for the equivalence testers
//
// Samplers here are closures over seeded RNGs: candidates use the
// crate's own algorithms, references use rand_distr.

use super::*;
use crate::distributions::{algorithms, SamplerError};
use crate::domain::{self, Domain};
use crate::grid::{domains, ParameterPoint};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Poisson};

fn real(point: &ParameterPoint, name: &str) -> Result<f64, SamplerError> {
    point
        .get(name)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| SamplerError::MissingParameter(name.to_string()))
}

/// Candidate == reference == normal: passes at every point
#[test]
fn test_normal_vs_normal_passes() {
    let mut a = StdRng::seed_from_u64(11);
    let mut b = StdRng::seed_from_u64(12);
    let mut candidate = |point: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> {
        let (mu, sd) = (real(point, "mu")?, real(point, "sd")?);
        Ok((0..size)
            .map(|_| mu + sd * algorithms::std_normal(&mut a))
            .collect())
    };
    let mut reference = |size: usize, params: &NamedParams| -> Result<SampleSet, SamplerError> {
        let normal = Normal::new(params.real("mu")?, params.real("sd")?)
            .map_err(|e| SamplerError::invalid("sd", format!("{:?}", e), "rejected by reference"))?;
        Ok(normal.sample_iter(&mut b).take(size).collect())
    };

    let config = EquivalenceConfig::continuous().with_seed(1).with_points(6);
    let grid = domains([
        ("mu", Domain::reals(&[-10.0, -1.0, 0.0, 2.5, 10.0])),
        ("sd", Domain::reals(&[0.0, 0.5, 2.0, 100.0])),
    ]);
    let report = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap();

    assert_eq!(report.outcomes.len(), 6);
    assert_eq!(report.test, TestKind::KolmogorovSmirnov);
    assert!(report.outcomes.iter().all(|o| o.pvalue > config.alpha));
    assert!(report.outcomes.iter().all(|o| o.draws <= config.fails + 1));
}

/// A mean offset of 5 is systematic: every retry fails
#[test]
fn test_shifted_mean_fails_every_retry() {
    let mut a = StdRng::seed_from_u64(21);
    let mut b = StdRng::seed_from_u64(22);
    let mut candidate = |point: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> {
        let mu = real(point, "mu")? + 5.0;
        Ok((0..size)
            .map(|_| mu + algorithms::std_normal(&mut a))
            .collect())
    };
    let mut reference = |size: usize, params: &NamedParams| -> Result<SampleSet, SamplerError> {
        let mu = params.real("mu")?;
        Ok((0..size)
            .map(|_| mu + algorithms::std_normal(&mut b))
            .collect())
    };

    let config = EquivalenceConfig::continuous().with_size(2000).with_fails(3);
    let grid = domains([("mu", Domain::reals(&[-1.0, 0.0, 1.0]))]);
    let err = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap_err();

    match err {
        EquivalenceError::StatisticalMismatch {
            point,
            pvalue,
            draws,
            ..
        } => {
            assert_eq!(point.get("mu"), Some(&crate::domain::ParamValue::Real(0.0)));
            assert!(pvalue < 1e-10);
            assert_eq!(draws, 4);
        }
        other => panic!("Expected StatisticalMismatch, got {:?}", other),
    }
}

/// Constant 3 on both sides: tables are `{3: 100000}` and the chi-square
/// test is skipped
#[test]
fn test_constant_samplers_short_circuit() {
    let mut candidate =
        |_: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> { Ok(vec![3.0; size]) };
    let mut reference =
        |size: usize, _: &NamedParams| -> Result<SampleSet, SamplerError> { Ok(vec![3.0; size]) };

    let config = EquivalenceConfig::discrete().with_seed(3);
    assert_eq!(config.size, 100_000);
    let grid = domains([("c", Domain::ints(&[0, 3, 10]))]);
    let report = check_discrete(&mut candidate, &mut reference, grid, &config).unwrap();

    assert_eq!(report.outcomes.len(), 1);
    let outcome = &report.outcomes[0];
    assert!(outcome.short_circuit);
    assert_eq!(outcome.pvalue, 1.0);
    assert_eq!(outcome.draws, 1);
}

/// Matching Poisson rates pass within the retry budget
#[test]
fn test_poisson_vs_poisson_passes() {
    let mut a = StdRng::seed_from_u64(31);
    let mut b = StdRng::seed_from_u64(32);
    let mut candidate = |point: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> {
        let mu = real(point, "mu")?;
        Ok((0..size)
            .map(|_| algorithms::poisson(mu, &mut a) as f64)
            .collect())
    };
    let mut reference = |size: usize, params: &NamedParams| -> Result<SampleSet, SamplerError> {
        let mu = params.real("mu")?;
        let poisson = Poisson::new(mu)
            .map_err(|e| SamplerError::invalid("mu", mu, format!("{:?}", e)))?;
        Ok(poisson.sample_iter(&mut b).take(size).collect())
    };

    let config = EquivalenceConfig::discrete()
        .with_size(500)
        .with_fails(20)
        .with_seed(4);
    let grid = domains([("mu", Domain::reals(&[0.0, 0.5, 3.0, 12.0, 50.0]))]);
    let report = check_discrete(&mut candidate, &mut reference, grid, &config).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|o| o.draws <= 21));
}

/// Sampler errors end the check at once, without retries
#[test]
fn test_malformed_domain_not_retried() {
    let mut calls = 0;
    let mut candidate = |point: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> {
        calls += 1;
        let tau = real(point, "tau")?;
        Ok(vec![tau; size])
    };
    let mut reference =
        |size: usize, _: &NamedParams| -> Result<SampleSet, SamplerError> { Ok(vec![0.0; size]) };

    let config = EquivalenceConfig::continuous().with_size(10);
    let grid = domains([("sd", domain::rplus())]);
    let err = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap_err();

    match err {
        EquivalenceError::MalformedDomain { reason, .. } => {
            assert!(reason.contains("tau"), "{}", reason);
        }
        other => panic!("Expected MalformedDomain, got {:?}", other),
    }
    assert_eq!(calls, 1);
}

/// Reference-side parameter errors are malformed domains too
#[test]
fn test_reference_type_error_is_malformed() {
    let mut candidate =
        |_: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> { Ok(vec![0.0; size]) };
    let mut reference = |size: usize, params: &NamedParams| -> Result<SampleSet, SamplerError> {
        let w = params.real("p")?;
        Ok(vec![w; size])
    };

    let config = EquivalenceConfig::discrete().with_size(10);
    let grid = domains([("p", domain::simplex(3))]);
    let err = check_discrete(&mut candidate, &mut reference, grid, &config).unwrap_err();
    assert!(matches!(err, EquivalenceError::MalformedDomain { .. }));
    assert!(err.to_string().contains("reference sampler"));
}

/// NaN samples cannot be tested
#[test]
fn test_nan_samples_are_malformed() {
    let mut candidate =
        |_: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> { Ok(vec![f64::NAN; size]) };
    let mut reference =
        |size: usize, _: &NamedParams| -> Result<SampleSet, SamplerError> { Ok(vec![0.0; size]) };

    let config = EquivalenceConfig::continuous().with_size(10);
    let grid = domains([("x", Domain::reals(&[0.0, 1.0, 2.0]))]);
    let err = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap_err();
    assert!(matches!(err, EquivalenceError::MalformedDomain { .. }));
}

/// The first failing point stops the scan
#[test]
fn test_stops_at_first_failing_point() {
    let mut seen = Vec::new();
    let mut candidate = |point: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> {
        let x = real(point, "x")?;
        seen.push(x);
        Ok((0..size).map(|i| i as f64 + x).collect())
    };
    let mut reference = |size: usize, _: &NamedParams| -> Result<SampleSet, SamplerError> {
        Ok((0..size).map(|i| i as f64).collect())
    };

    let config = EquivalenceConfig::continuous().with_size(100).with_fails(0);
    let grid = domains([("x", Domain::reals(&[-1.0, 0.0, 1000.0, 2000.0, 1.0]))]);
    let err = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap_err();

    assert!(err.is_mismatch());
    // x = 0 matches exactly, x = 1000 never overlaps
    assert_eq!(seen, vec![0.0, 1000.0]);
}

/// Retried draws are counted in the outcome
#[test]
fn test_retry_counts_recorded() {
    let mut attempt = 0;
    let mut candidate = |_: &ParameterPoint, size: usize| -> Result<SampleSet, SamplerError> {
        attempt += 1;
        let offset = if attempt < 3 { 1000.0 } else { 0.0 };
        Ok((0..size).map(|i| i as f64 + offset).collect())
    };
    let mut reference = |size: usize, _: &NamedParams| -> Result<SampleSet, SamplerError> {
        Ok((0..size).map(|i| i as f64).collect())
    };

    let config = EquivalenceConfig::continuous().with_size(100).with_fails(5);
    let grid = domains([("x", Domain::reals(&[0.0, 1.0, 2.0]))]);
    let report = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap();

    assert_eq!(report.outcomes[0].draws, 3);
    assert_eq!(report.retried_points(), 1);
}
