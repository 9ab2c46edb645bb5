// Two-sample goodness-of-fit statistics
//
// - Kolmogorov–Smirnov for continuous samples: D = sup |F1 - F2| over the
//   merged sample, p-value from the asymptotic Kolmogorov distribution with
//   Stephens' small-sample correction (en + 0.12 + 0.11/en).
// - Chi-square for discrete samples: frequency tables aligned on the union
//   of observed values, compared with the two-sample (homogeneity) form so
//   that values seen on only one side contribute instead of dividing by 0.
// - Uses statrs for the chi-square survival function
// - Uses trueno::Vector and aprender::stats::DescriptiveStats for summaries

use anyhow::{Context, Result};
use aprender::stats::DescriptiveStats;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use trueno::Vector;

/// Result of a two-sample Kolmogorov–Smirnov test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsTest {
    /// Largest distance between the two empirical CDFs
    pub statistic: f64,

    /// Probability of a distance at least this large if both samples share
    /// one distribution
    pub pvalue: f64,
}

/// Two-sample Kolmogorov–Smirnov test
///
/// # Example
/// ```
/// use distcheck::equivalence::statistics::ks_2samp;
///
/// let a: Vec<f64> = (0..500).map(|i| i as f64).collect();
/// let b: Vec<f64> = (0..500).map(|i| i as f64 + 1000.0).collect();
///
/// let test = ks_2samp(&a, &b).unwrap();
/// assert_eq!(test.statistic, 1.0);
/// assert!(test.pvalue < 1e-10);
/// ```
pub fn ks_2samp(first: &[f64], second: &[f64]) -> Result<KsTest> {
    if first.is_empty() || second.is_empty() {
        anyhow::bail!("Cannot compare empty samples");
    }
    if first.iter().chain(second).any(|x| x.is_nan()) {
        anyhow::bail!("Samples contain NaN");
    }

    let mut a = first.to_vec();
    let mut b = second.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let statistic = ks_statistic(&a, &b);

    let (n, m) = (a.len() as f64, b.len() as f64);
    let en = (n * m / (n + m)).sqrt();
    let pvalue = kolmogorov_sf((en + 0.12 + 0.11 / en) * statistic);

    Ok(KsTest { statistic, pvalue })
}

/// Sup distance between empirical CDFs of two sorted samples
///
/// Tied values advance both CDFs together before the distance is taken.
fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;

    while i < a.len() && j < b.len() {
        let x = if a[i].total_cmp(&b[j]) == Ordering::Greater {
            b[j]
        } else {
            a[i]
        };
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }

    d
}

/// Survival function of the Kolmogorov distribution
///
/// Two series are used: the Jacobi-theta form converges fast for small x,
/// the alternating form for large x.
pub fn kolmogorov_sf(x: f64) -> f64 {
    const MAX_TERMS: usize = 100;

    if x.is_nan() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }

    if x < 1.18 {
        let w = std::f64::consts::PI * std::f64::consts::PI / (8.0 * x * x);
        let mut cdf = 0.0;
        for k in 1..=MAX_TERMS {
            let odd = (2 * k - 1) as f64;
            let term = (-odd * odd * w).exp();
            cdf += term;
            if term < 1e-17 {
                break;
            }
        }
        cdf *= (2.0 * std::f64::consts::PI).sqrt() / x;
        (1.0 - cdf).clamp(0.0, 1.0)
    } else {
        let mut sf = 0.0;
        let mut sign = 1.0;
        for k in 1..=MAX_TERMS {
            let kf = k as f64;
            let term = (-2.0 * kf * kf * x * x).exp();
            sf += sign * term;
            if term < 1e-17 {
                break;
            }
            sign = -sign;
        }
        (2.0 * sf).clamp(0.0, 1.0)
    }
}

/// Sample value usable as an ordered map key
///
/// Ordered by `total_cmp`; negative zero is folded into zero on entry.
#[derive(Debug, Clone, Copy)]
struct ValueKey(f64);

impl PartialEq for ValueKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ValueKey {}

impl PartialOrd for ValueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Counts of each distinct realized value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    counts: BTreeMap<ValueKey, u64>,
    total: u64,
}

impl FrequencyTable {
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        let mut table = Self::default();
        for &x in samples {
            if x.is_nan() {
                anyhow::bail!("Samples contain NaN");
            }
            let key = if x == 0.0 { 0.0 } else { x };
            *table.counts.entry(ValueKey(key)).or_insert(0) += 1;
            table.total += 1;
        }
        Ok(table)
    }

    pub fn count(&self, value: f64) -> u64 {
        let key = if value == 0.0 { 0.0 } else { value };
        self.counts.get(&ValueKey(key)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.counts.keys().map(|k| k.0)
    }
}

/// Observed and expected counts over the union of both tables' values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedFrequencies {
    pub values: Vec<f64>,
    pub observed: Vec<u64>,
    pub expected: Vec<u64>,
}

impl AlignedFrequencies {
    /// Align two tables; a value missing from one side counts as zero there
    pub fn align(observed: &FrequencyTable, expected: &FrequencyTable) -> Self {
        let mut union: BTreeMap<ValueKey, (u64, u64)> = BTreeMap::new();
        for (key, count) in &observed.counts {
            union.entry(*key).or_default().0 = *count;
        }
        for (key, count) in &expected.counts {
            union.entry(*key).or_default().1 = *count;
        }

        let mut aligned = Self {
            values: Vec::with_capacity(union.len()),
            observed: Vec::with_capacity(union.len()),
            expected: Vec::with_capacity(union.len()),
        };
        for (key, (o, e)) in union {
            aligned.values.push(key.0);
            aligned.observed.push(o);
            aligned.expected.push(e);
        }
        aligned
    }

    /// Every aligned observed/expected pair is identical
    pub fn is_perfect_match(&self) -> bool {
        self.observed == self.expected
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a chi-square frequency comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub pvalue: f64,
    pub dof: usize,
    /// The perfect-match shortcut fired; no statistic was computed
    pub short_circuit: bool,
}

/// Two-sample chi-square statistic over aligned frequencies
///
/// `sum (sqrt(S/R) o_i - sqrt(R/S) e_i)^2 / (o_i + e_i)` where `R`, `S` are
/// the observed and expected totals. One degree of freedom is lost when the
/// totals are equal.
pub fn chi_square(aligned: &AlignedFrequencies) -> Result<ChiSquareTest> {
    let r: u64 = aligned.observed.iter().sum();
    let s: u64 = aligned.expected.iter().sum();
    if r == 0 || s == 0 {
        anyhow::bail!("Cannot compare empty frequency tables");
    }

    let (rf, sf) = (r as f64, s as f64);
    let (wr, ws) = ((sf / rf).sqrt(), (rf / sf).sqrt());
    let statistic: f64 = aligned
        .observed
        .iter()
        .zip(&aligned.expected)
        .filter(|(o, e)| **o + **e > 0)
        .map(|(&o, &e)| {
            let diff = wr * o as f64 - ws * e as f64;
            diff * diff / (o + e) as f64
        })
        .sum();

    let bins = aligned.len();
    let dof = if r == s { bins.saturating_sub(1) } else { bins };
    if dof == 0 {
        return Ok(ChiSquareTest {
            statistic,
            pvalue: 1.0,
            dof,
            short_circuit: false,
        });
    }

    let dist = ChiSquared::new(dof as f64)
        .map_err(|e| anyhow::anyhow!("Failed to build chi-square distribution: {}", e))?;

    Ok(ChiSquareTest {
        statistic,
        pvalue: dist.sf(statistic),
        dof,
        short_circuit: false,
    })
}

/// Compare observed against expected samples
///
/// Identical aligned tables short-circuit to p = 1 without computing the
/// statistic (it would be degenerate).
pub fn compare_frequencies(observed: &[f64], expected: &[f64]) -> Result<ChiSquareTest> {
    let observed = FrequencyTable::from_samples(observed).context("Invalid observed samples")?;
    let expected = FrequencyTable::from_samples(expected).context("Invalid expected samples")?;
    let aligned = AlignedFrequencies::align(&observed, &expected);

    if aligned.is_perfect_match() {
        return Ok(ChiSquareTest {
            statistic: 0.0,
            pvalue: 1.0,
            dof: aligned.len().saturating_sub(1),
            short_circuit: true,
        });
    }

    chi_square(&aligned)
}

/// Descriptive statistics of one sample set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub mean: f32,
    pub median: f32,
    pub variance: f32,
}

/// Summarize samples using trueno Vector statistics
///
/// Note: trueno computes the population variance (divide by n).
pub fn summarize(samples: &[f64]) -> Result<SampleSummary> {
    if samples.is_empty() {
        anyhow::bail!("Cannot summarize an empty sample");
    }
    let narrowed: Vec<f32> = samples.iter().map(|&x| x as f32).collect();
    let vec = Vector::from_slice(&narrowed);

    let mean = vec.mean().context("Failed to compute mean")?;
    let variance = vec.variance().context("Failed to compute variance")?;
    let median = median(&vec)?;

    Ok(SampleSummary {
        mean,
        median,
        variance,
    })
}

/// Calculate median using aprender's DescriptiveStats
///
/// aprender's quantile(0.5) implements the R-7 method with QuickSelect.
pub fn median(vector: &Vector<f32>) -> Result<f32> {
    let stats = DescriptiveStats::new(vector);
    stats
        .quantile(0.5)
        .map_err(|e| anyhow::anyhow!("Failed to compute median: {}", e))
}
