//! distcheck - statistical equivalence checks for random samplers
//!
//! This library checks that a sampler draws from the distribution it claims
//! to, by comparing it against a trusted reference sampler across a grid of
//! parameter values with two-sample goodness-of-fit tests
//! (Kolmogorov–Smirnov for continuous families, chi-square for discrete
//! ones), retrying a bounded number of times to absorb statistical noise.

pub mod catalog;
pub mod cli;
pub mod distributions;
pub mod domain;
pub mod equivalence;
pub mod grid;
pub mod reference;
pub mod shape;
pub mod suite;
