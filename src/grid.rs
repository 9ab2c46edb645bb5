//! Parameter grids: cross-products of domains
//!
//! [`ParameterGrid`] walks the Cartesian product of a set of [`Domain`]s in
//! mixed-radix order (the last parameter varies fastest). When the product
//! is larger than the requested number of points, a random subset of
//! distinct combinations is chosen up front and emitted in product order,
//! so the walk itself stays lazy and deterministic for a given RNG.

use crate::domain::{Domain, ParamValue};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameter name → domain, in declaration order
pub type DomainMap = Vec<(String, Domain)>;

/// Build a [`DomainMap`] from `(name, domain)` pairs
pub fn domains<'a, I>(pairs: I) -> DomainMap
where
    I: IntoIterator<Item = (&'a str, Domain)>,
{
    pairs
        .into_iter()
        .map(|(name, domain)| (name.to_string(), domain))
        .collect()
}

/// One concrete assignment of values to every declared parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterPoint {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: ParamValue) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, ParamValue)> for ParameterPoint {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ParameterPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

/// Lazy iterator over parameter combinations
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    domains: DomainMap,
    /// Product indices to visit; `None` walks the full product
    selection: Option<Vec<usize>>,
    cursor: usize,
    total: usize,
}

impl ParameterGrid {
    /// Grid over `domains` with about `n_samples` points
    ///
    /// `n_samples == 0` disables the cap and walks the full product.
    pub fn new<R: Rng + ?Sized>(domains: DomainMap, n_samples: usize, rng: &mut R) -> Self {
        let total = if domains.is_empty() {
            0
        } else {
            domains
                .iter()
                .map(|(_, d)| d.len())
                .fold(1usize, |acc, n| acc.saturating_mul(n))
        };

        let selection = if n_samples > 0 && total > n_samples {
            let mut picked = rand::seq::index::sample(rng, total, n_samples).into_vec();
            picked.sort_unstable();
            Some(picked)
        } else {
            None
        };

        Self {
            domains,
            selection,
            cursor: 0,
            total,
        }
    }

    /// Size of the full cross-product
    pub fn product_size(&self) -> usize {
        self.total
    }

    /// Number of points this grid emits
    pub fn point_count(&self) -> usize {
        match &self.selection {
            Some(picked) => picked.len(),
            None => self.total,
        }
    }

    /// Decode a product index into a point (mixed radix, last name fastest)
    fn point_at(&self, mut index: usize) -> ParameterPoint {
        let mut digits = vec![0usize; self.domains.len()];
        for (slot, (_, domain)) in digits.iter_mut().zip(&self.domains).rev() {
            *slot = index % domain.len();
            index /= domain.len();
        }

        self.domains
            .iter()
            .zip(digits)
            .map(|((name, domain), digit)| (name.clone(), domain.values()[digit].clone()))
            .collect()
    }
}

impl Iterator for ParameterGrid {
    type Item = ParameterPoint;

    fn next(&mut self) -> Option<ParameterPoint> {
        let index = match &self.selection {
            Some(picked) => *picked.get(self.cursor)?,
            None if self.cursor < self.total => self.cursor,
            None => return None,
        };
        self.cursor += 1;
        Some(self.point_at(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.point_count() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ParameterGrid {}
