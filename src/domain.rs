//! Parameter domains for equivalence grids
//!
//! A [`Domain`] is the finite set of values one distribution parameter takes
//! during a check. Domains are built from an ordered list whose first and
//! last entries are the *edges* of the support (often infinite or otherwise
//! unusable as test input); only the interior entries are handed to samplers.
//!
//! ```
//! use distcheck::domain::{Domain, ParamValue};
//!
//! let nat = Domain::ints(&[0, 1, 2, 3, 2000]);
//! assert_eq!(nat.values().len(), 3);
//! assert_eq!(nat.lower(), &ParamValue::Int(0));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// One concrete parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Real(f64),
    /// Event-shaped parameter such as a probability vector
    Vector(Vec<f64>),
}

impl ParamValue {
    /// Numeric view of a scalar value (integers widen to `f64`)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Real(v) => Some(*v),
            ParamValue::Vector(_) => None,
        }
    }

    /// Integer view; reals are accepted only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Real(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            ParamValue::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Real(_) => "real",
            ParamValue::Vector(_) => "vector",
        }
    }
}

impl Neg for ParamValue {
    type Output = ParamValue;

    fn neg(self) -> ParamValue {
        match self {
            ParamValue::Int(v) => ParamValue::Int(-v),
            ParamValue::Real(v) => ParamValue::Real(-v),
            ParamValue::Vector(v) => ParamValue::Vector(v.into_iter().map(|x| -x).collect()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Real(v) => write!(f, "{}", v),
            ParamValue::Vector(v) => {
                write!(f, "[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", x)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Finite set of legal values for one distribution parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    values: Vec<ParamValue>,
    lower: ParamValue,
    upper: ParamValue,
}

impl Domain {
    /// Build a domain from an edge-inclusive list: `[lower, v1, .., vn, upper]`
    ///
    /// # Panics
    /// Panics if fewer than two entries are given, since the edges are
    /// mandatory. Domains are static test fixtures, not user input.
    pub fn new(all: Vec<ParamValue>) -> Self {
        assert!(all.len() >= 2, "domain needs at least its two edges");
        let mut values = all;
        let upper = values.pop().unwrap_or(ParamValue::Real(f64::INFINITY));
        let lower = values.remove(0);
        Self {
            values,
            lower,
            upper,
        }
    }

    /// Domain with explicit edges; every value in `values` is used
    pub fn with_edges(values: Vec<ParamValue>, lower: ParamValue, upper: ParamValue) -> Self {
        Self {
            values,
            lower,
            upper,
        }
    }

    pub fn reals(all: &[f64]) -> Self {
        Self::new(all.iter().copied().map(ParamValue::Real).collect())
    }

    pub fn ints(all: &[i64]) -> Self {
        Self::new(all.iter().copied().map(ParamValue::Int).collect())
    }

    /// Interior test values
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    pub fn lower(&self) -> &ParamValue {
        &self.lower
    }

    pub fn upper(&self) -> &ParamValue {
        &self.upper
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a standard domain by name; a leading `-` negates it
    ///
    /// `Simplex3` style names produce probability-vector domains.
    pub fn named(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix('-') {
            return Self::named(rest).map(|d| -d);
        }
        let domain = match name {
            "R" => r(),
            "Rplus" => rplus(),
            "Rplusbig" => rplusbig(),
            "Rminusbig" => rminusbig(),
            "Rplusunif" => rplusunif(),
            "Runif" => runif(),
            "Unit" => unit(),
            "Nat" => nat(),
            "NatSmall" => nat_small(),
            "NatBig" => nat_big(),
            "I" => int_range(),
            "Rplusdunif" => rplusdunif(),
            other => {
                let n = other.strip_prefix("Simplex")?.parse::<usize>().ok()?;
                if n < 2 {
                    return None;
                }
                simplex(n)
            }
        };
        Some(domain)
    }
}

impl Neg for Domain {
    type Output = Domain;

    /// Negated values; the edges swap sides
    fn neg(self) -> Domain {
        Domain {
            values: self.values.into_iter().map(|v| -v).collect(),
            lower: -self.upper,
            upper: -self.lower,
        }
    }
}

const INF: f64 = f64::INFINITY;

/// All reals
pub fn r() -> Domain {
    Domain::reals(&[-INF, -2.1, -1.0, -0.01, 0.0, 0.01, 1.0, 2.1, INF])
}

/// Positive reals, including tiny and large magnitudes
pub fn rplus() -> Domain {
    Domain::reals(&[0.0, 0.01, 0.1, 0.9, 0.99, 1.0, 1.5, 2.0, 100.0, INF])
}

/// Positive reals without the extreme small values
pub fn rplusbig() -> Domain {
    Domain::reals(&[0.0, 0.5, 0.9, 0.99, 1.0, 1.5, 2.0, 20.0, INF])
}

pub fn rminusbig() -> Domain {
    Domain::reals(&[-INF, -2.0, -1.5, -1.0, -0.99, -0.9, -0.5, -0.01, 0.0])
}

pub fn rplusunif() -> Domain {
    Domain::reals(&[0.0, 0.41, 0.9, 0.99, 1.0, 1.5, 2.0, INF])
}

/// Small reals straddling zero
pub fn runif() -> Domain {
    Domain::reals(&[-1.0, -0.4, 0.0, 0.4, 1.0])
}

/// Open unit interval
pub fn unit() -> Domain {
    Domain::reals(&[0.0, 0.001, 0.1, 0.5, 0.75, 0.99, 1.0])
}

/// Small naturals
pub fn nat() -> Domain {
    Domain::ints(&[0, 1, 2, 3, 2000])
}

pub fn nat_small() -> Domain {
    Domain::ints(&[0, 3, 4, 5, 1000])
}

pub fn nat_big() -> Domain {
    Domain::ints(&[0, 1, 2, 3, 5000, 50000])
}

/// Integers straddling zero
pub fn int_range() -> Domain {
    Domain::ints(&[-1000, -3, -2, -1, 0, 1, 2, 3, 1000])
}

/// Integer-valued shapes for discrete Weibull style parameters
pub fn rplusdunif() -> Domain {
    Domain::ints(&[2, 10, 100])
}

/// Probability vectors of length `n`
///
/// Values are fixed rather than random so grids stay reproducible: the
/// uniform vector, a vector with one dominant category, and a linearly
/// increasing vector.
pub fn simplex(n: usize) -> Domain {
    let uniform = vec![1.0 / n as f64; n];

    let mut dominant = vec![0.1 / (n - 1) as f64; n];
    dominant[0] = 0.9;

    let total = (n * (n + 1) / 2) as f64;
    let increasing = (1..=n).map(|i| i as f64 / total).collect();

    let mut lower = vec![0.0; n];
    lower[0] = 1.0;
    let mut upper = vec![0.0; n];
    upper[n - 1] = 1.0;

    Domain::with_edges(
        vec![
            ParamValue::Vector(uniform),
            ParamValue::Vector(dominant),
            ParamValue::Vector(increasing),
        ],
        ParamValue::Vector(lower),
        ParamValue::Vector(upper),
    )
}
