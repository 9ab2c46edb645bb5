// Statistical equivalence of random samplers
//
// A candidate sampler is checked against a trusted reference across a grid
// of parameter points. At each point both sides draw the same number of
// samples and a goodness-of-fit test decides whether they plausibly share
// one distribution:
// - Continuous families: two-sample Kolmogorov–Smirnov
// - Discrete families: chi-square over frequency tables aligned on the
//   union of observed values
//
// Testing at significance alpha rejects a correct sampler with probability
// alpha per draw, so failing draws are retried a bounded number of times.
// A real mismatch fails every retry and is reported with the point that
// exposed it.
//
// Implementation:
// - Uses statrs for the chi-square survival function
// - Uses trueno for SIMD-optimized vector statistics of accepted draws
// - Uses aprender's DescriptiveStats for the median

mod config;
pub mod statistics;
mod tester;
mod verdict;

pub use config::{ConfigOverrides, EquivalenceConfig};
pub use statistics::{compare_frequencies, ks_2samp, ChiSquareTest, KsTest, SampleSummary};
pub use tester::{
    check_continuous, check_discrete, CandidateSampler, NamedParams, ReferenceSampler, SampleSet,
};
pub use verdict::{
    failure_report_string, EquivalenceError, EquivalenceReport, PointOutcome, TestKind,
};

#[cfg(test)]
mod tests;
