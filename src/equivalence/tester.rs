// Equivalence testers: candidate vs reference over a parameter grid
//
// Each grid point is given at most `fails + 1` draws. A draw passes when
// its p-value exceeds alpha; the first point that never passes ends the
// check. Sampler errors mean the point itself is unusable and are reported
// immediately without spending retries.

use crate::distributions::SamplerError;
use crate::domain::ParamValue;
use crate::equivalence::config::EquivalenceConfig;
use crate::equivalence::statistics::{compare_frequencies, ks_2samp, summarize};
use crate::equivalence::verdict::{EquivalenceError, EquivalenceReport, PointOutcome, TestKind};
use crate::grid::{DomainMap, ParameterGrid, ParameterPoint};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Samples produced by one sampler invocation
pub type SampleSet = Vec<f64>;

/// Sampler under test, driven by a grid point
pub trait CandidateSampler {
    fn sample(&mut self, point: &ParameterPoint, size: usize) -> Result<SampleSet, SamplerError>;
}

impl<F> CandidateSampler for F
where
    F: FnMut(&ParameterPoint, usize) -> Result<SampleSet, SamplerError>,
{
    fn sample(&mut self, point: &ParameterPoint, size: usize) -> Result<SampleSet, SamplerError> {
        self(point, size)
    }
}

/// Trusted sampler, driven by named parameters
pub trait ReferenceSampler {
    fn sample(&mut self, size: usize, params: &NamedParams) -> Result<SampleSet, SamplerError>;
}

impl<F> ReferenceSampler for F
where
    F: FnMut(usize, &NamedParams) -> Result<SampleSet, SamplerError>,
{
    fn sample(&mut self, size: usize, params: &NamedParams) -> Result<SampleSet, SamplerError> {
        self(size, params)
    }
}

/// Named parameters handed to a reference sampler
///
/// Typed accessors report missing or mistyped parameters as
/// [`SamplerError`]s, which the testers surface as malformed domains.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedParams {
    values: BTreeMap<String, ParamValue>,
}

impl NamedParams {
    pub fn from_point(point: &ParameterPoint) -> Self {
        Self {
            values: point
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&ParamValue, SamplerError> {
        self.values
            .get(name)
            .ok_or_else(|| SamplerError::MissingParameter(name.to_string()))
    }

    /// Numeric parameter; integers widen to reals
    pub fn real(&self, name: &str) -> Result<f64, SamplerError> {
        let value = self.get(name)?;
        value.as_f64().ok_or_else(|| SamplerError::WrongType {
            name: name.to_string(),
            expected: "real",
            found: value.type_name(),
        })
    }

    /// Integral parameter; reals with no fractional part are accepted
    pub fn int(&self, name: &str) -> Result<i64, SamplerError> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| SamplerError::WrongType {
            name: name.to_string(),
            expected: "integer",
            found: value.type_name(),
        })
    }

    pub fn vector(&self, name: &str) -> Result<&[f64], SamplerError> {
        let value = self.get(name)?;
        value.as_vector().ok_or_else(|| SamplerError::WrongType {
            name: name.to_string(),
            expected: "vector",
            found: value.type_name(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Outcome of one statistical comparison
struct Draw {
    statistic: f64,
    pvalue: f64,
    short_circuit: bool,
}

/// Check a continuous candidate with the two-sample Kolmogorov–Smirnov test
///
/// # Example
/// ```
/// use distcheck::distributions::SamplerError;
/// use distcheck::domain::Domain;
/// use distcheck::equivalence::{check_continuous, EquivalenceConfig, NamedParams};
/// use distcheck::grid::{domains, ParameterPoint};
/// use rand::{rngs::StdRng, Rng, SeedableRng};
///
/// let mut a = StdRng::seed_from_u64(1);
/// let mut b = StdRng::seed_from_u64(2);
/// let mut candidate = |point: &ParameterPoint, size: usize| -> Result<Vec<f64>, SamplerError> {
///     let hi = point.get("hi").and_then(|v| v.as_f64()).unwrap_or(1.0);
///     Ok((0..size).map(|_| a.gen_range(0.0..hi)).collect())
/// };
/// let mut reference = |size: usize, params: &NamedParams| -> Result<Vec<f64>, SamplerError> {
///     let hi = params.real("hi")?;
///     Ok((0..size).map(|_| b.gen_range(0.0..hi)).collect())
/// };
///
/// let config = EquivalenceConfig::continuous().with_size(1000).with_seed(0);
/// let grid = domains([("hi", Domain::reals(&[0.0, 1.0, 5.0, 10.0]))]);
/// let report = check_continuous(&mut candidate, &mut reference, grid, &config).unwrap();
/// assert_eq!(report.outcomes.len(), 2);
/// ```
pub fn check_continuous<C, R>(
    candidate: &mut C,
    reference: &mut R,
    domains: DomainMap,
    config: &EquivalenceConfig,
) -> Result<EquivalenceReport, EquivalenceError>
where
    C: CandidateSampler + ?Sized,
    R: ReferenceSampler + ?Sized,
{
    run_check(
        TestKind::KolmogorovSmirnov,
        candidate,
        reference,
        domains,
        config,
        |observed, expected| {
            let test = ks_2samp(observed, expected)?;
            Ok(Draw {
                statistic: test.statistic,
                pvalue: test.pvalue,
                short_circuit: false,
            })
        },
    )
}

/// Check a discrete candidate by comparing frequency tables
///
/// The candidate's draws are the observed frequencies and the reference's
/// the expected ones. Identical tables pass without a chi-square test.
pub fn check_discrete<C, R>(
    candidate: &mut C,
    reference: &mut R,
    domains: DomainMap,
    config: &EquivalenceConfig,
) -> Result<EquivalenceReport, EquivalenceError>
where
    C: CandidateSampler + ?Sized,
    R: ReferenceSampler + ?Sized,
{
    run_check(
        TestKind::ChiSquare,
        candidate,
        reference,
        domains,
        config,
        |observed, expected| {
            let test = compare_frequencies(observed, expected)?;
            Ok(Draw {
                statistic: test.statistic,
                pvalue: test.pvalue,
                short_circuit: test.short_circuit,
            })
        },
    )
}

fn run_check<C, R, T>(
    kind: TestKind,
    candidate: &mut C,
    reference: &mut R,
    domains: DomainMap,
    config: &EquivalenceConfig,
    mut test: T,
) -> Result<EquivalenceReport, EquivalenceError>
where
    C: CandidateSampler + ?Sized,
    R: ReferenceSampler + ?Sized,
    T: FnMut(&[f64], &[f64]) -> anyhow::Result<Draw>,
{
    config.validate().map_err(EquivalenceError::InvalidConfig)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let grid = ParameterGrid::new(domains, config.points, &mut rng);
    tracing::debug!(
        "{} check over {} of {} grid points",
        kind.label(),
        grid.point_count(),
        grid.product_size()
    );

    let mut outcomes = Vec::with_capacity(grid.point_count());
    for point in grid {
        let params = NamedParams::from_point(&point);
        let mut draws = 0;

        loop {
            draws += 1;

            let observed = candidate
                .sample(&point, config.size)
                .map_err(|e| malformed(&point, "candidate", e))?;
            let expected = reference
                .sample(config.size, &params)
                .map_err(|e| malformed(&point, "reference", e))?;

            let draw = test(&observed, &expected).map_err(|e| EquivalenceError::MalformedDomain {
                point: point.clone(),
                reason: format!("{:#}", e),
            })?;
            tracing::debug!(
                "{} draw {}: statistic={:.4} p={:.4}",
                point,
                draws,
                draw.statistic,
                draw.pvalue
            );

            if draw.pvalue > config.alpha {
                tracing::info!("{} passed after {} draw(s)", point, draws);
                outcomes.push(PointOutcome {
                    point: point.clone(),
                    statistic: draw.statistic,
                    pvalue: draw.pvalue,
                    draws,
                    short_circuit: draw.short_circuit,
                    candidate: summarize(&observed).ok(),
                });
                break;
            }

            if draws > config.fails {
                return Err(EquivalenceError::StatisticalMismatch {
                    point,
                    pvalue: draw.pvalue,
                    alpha: config.alpha,
                    draws,
                });
            }

            tracing::warn!(
                "{}: p-value {:.3e} <= alpha {}, redrawing ({} of {} retries)",
                point,
                draw.pvalue,
                config.alpha,
                draws,
                config.fails
            );
        }
    }

    Ok(EquivalenceReport {
        name: "candidate".to_string(),
        test: kind,
        outcomes,
        config: config.clone(),
    })
}

fn malformed(point: &ParameterPoint, side: &str, error: SamplerError) -> EquivalenceError {
    EquivalenceError::MalformedDomain {
        point: point.clone(),
        reason: format!("{} sampler: {}", side, error),
    }
}
