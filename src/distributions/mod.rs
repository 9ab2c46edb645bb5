//! Candidate samplers for the distribution catalog
//!
//! A [`RandomVariable`] pairs a [`Family`] with its parameters. Scalar
//! parameters may be arrays that broadcast against each other and against
//! an optional declared shape; event parameters (the probability vector of
//! a categorical) are consumed whole by every draw.
//!
//! ```
//! use distcheck::distributions::{Family, Param, RandomVariable};
//! use distcheck::shape::Size;
//! use rand::SeedableRng;
//!
//! let rv = RandomVariable::new(
//!     Family::Normal,
//!     vec![("mu", Param::Scalar(0.0)), ("sd", Param::Scalar(1.0))],
//! )
//! .unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let draws = rv.random(&Size::from(vec![4, 5]), &mut rng).unwrap();
//! assert_eq!(draws.shape(), &[4, 5]);
//! ```

pub mod algorithms;
mod family;

pub use family::Family;

use crate::domain::ParamValue;
use crate::grid::ParameterPoint;
use crate::shape::{broadcast_index, broadcast_shapes, draw_shape, SampleArray, ShapeError, Size};
use rand::Rng;
use thiserror::Error;

/// Errors raised by samplers when given parameters they cannot use
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    #[error("parameter '{name}' must be {expected}, got {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("unknown distribution family '{0}'")]
    UnknownFamily(String),

    #[error("sampler produced NaN")]
    NotANumber,

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

impl SamplerError {
    pub(crate) fn invalid(name: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        SamplerError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A distribution parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Scalar(f64),
    /// Row-major array that broadcasts like a numpy array
    Array { shape: Vec<usize>, values: Vec<f64> },
    /// Event vector, never broadcast
    Event(Vec<f64>),
}

impl Param {
    /// One-dimensional array parameter
    pub fn vector(values: Vec<f64>) -> Self {
        Param::Array {
            shape: vec![values.len()],
            values,
        }
    }

    fn shape(&self) -> &[usize] {
        match self {
            Param::Array { shape, .. } => shape,
            Param::Scalar(_) | Param::Event(_) => &[],
        }
    }

    fn element(&self, flat: usize, target: &[usize]) -> f64 {
        match self {
            Param::Scalar(v) => *v,
            Param::Array { shape, values } => values[broadcast_index(shape, target, flat)],
            Param::Event(_) => f64::NAN,
        }
    }
}

/// A distribution with bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
    family: Family,
    /// Scalar parameters, in `family.scalar_params()` order
    params: Vec<Param>,
    event: Vec<f64>,
    shape: Option<Vec<usize>>,
}

impl RandomVariable {
    /// Bind named parameters; every parameter the family declares is required
    pub fn new(family: Family, named: Vec<(&str, Param)>) -> Result<Self, SamplerError> {
        let mut params = Vec::with_capacity(family.scalar_params().len());
        for name in family.scalar_params() {
            let param = named
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, p)| p.clone())
                .ok_or_else(|| SamplerError::MissingParameter(name.to_string()))?;
            if let Param::Event(_) = param {
                return Err(SamplerError::WrongType {
                    name: name.to_string(),
                    expected: "scalar or array",
                    found: "vector",
                });
            }
            params.push(param);
        }

        let event = match family.event_param() {
            Some(name) => match named.iter().find(|(n, _)| *n == name) {
                Some((_, Param::Event(v))) => v.clone(),
                Some((_, Param::Array { values, shape })) if shape.len() == 1 => values.clone(),
                Some(_) => {
                    return Err(SamplerError::WrongType {
                        name: name.to_string(),
                        expected: "vector",
                        found: "scalar",
                    })
                }
                None => return Err(SamplerError::MissingParameter(name.to_string())),
            },
            None => Vec::new(),
        };

        let rv = Self {
            family,
            params,
            event,
            shape: None,
        };
        rv.validate()?;
        Ok(rv)
    }

    /// Bind the parameters of one grid point
    pub fn from_point(family: Family, point: &ParameterPoint) -> Result<Self, SamplerError> {
        let mut named = Vec::new();
        for name in family.scalar_params() {
            let value = point
                .get(name)
                .ok_or_else(|| SamplerError::MissingParameter(name.to_string()))?;
            let scalar = value.as_f64().ok_or_else(|| SamplerError::WrongType {
                name: name.to_string(),
                expected: "scalar",
                found: value.type_name(),
            })?;
            named.push((*name, Param::Scalar(scalar)));
        }
        if let Some(name) = family.event_param() {
            match point.get(name) {
                Some(ParamValue::Vector(v)) => named.push((name, Param::Event(v.clone()))),
                Some(other) => {
                    return Err(SamplerError::WrongType {
                        name: name.to_string(),
                        expected: "vector",
                        found: other.type_name(),
                    })
                }
                None => return Err(SamplerError::MissingParameter(name.to_string())),
            }
        }
        Self::new(family, named)
    }

    /// Declare the variable's shape; parameters must broadcast to it
    pub fn with_shape(mut self, shape: Vec<usize>) -> Result<Self, SamplerError> {
        let params_shape = self.params_shape()?;
        let joint = broadcast_shapes(&params_shape, &shape)?;
        if joint != shape {
            return Err(ShapeError::Incompatible {
                left: params_shape,
                right: shape,
            }
            .into());
        }
        self.shape = Some(shape);
        Ok(self)
    }

    pub fn family(&self) -> Family {
        self.family
    }

    fn params_shape(&self) -> Result<Vec<usize>, SamplerError> {
        let mut shape = Vec::new();
        for param in &self.params {
            shape = broadcast_shapes(&shape, param.shape())?;
        }
        Ok(shape)
    }

    /// Shape of a single draw
    pub fn dist_shape(&self) -> Result<Vec<usize>, SamplerError> {
        match &self.shape {
            Some(shape) => Ok(shape.clone()),
            None => self.params_shape(),
        }
    }

    /// Scalar arguments for each element of one draw, flattened
    fn element_args(&self, dist_shape: &[usize]) -> Vec<Vec<f64>> {
        let count: usize = dist_shape.iter().product();
        (0..count)
            .map(|flat| {
                self.params
                    .iter()
                    .map(|p| p.element(flat, dist_shape))
                    .collect()
            })
            .collect()
    }

    fn validate(&self) -> Result<(), SamplerError> {
        let dist_shape = self.dist_shape()?;
        for args in self.element_args(&dist_shape) {
            self.family.validate(&args, &self.event)?;
        }
        Ok(())
    }

    /// Draw samples with shape `size ++ dist_shape`, squeezed by [`draw_shape`]
    pub fn random<R: Rng + ?Sized>(
        &self,
        size: &Size,
        rng: &mut R,
    ) -> Result<SampleArray, SamplerError> {
        let dist_shape = self.dist_shape()?;
        let per_element = self.element_args(&dist_shape);

        let repeats = size.count();
        let mut values = Vec::with_capacity(repeats * per_element.len());
        for _ in 0..repeats {
            for args in &per_element {
                values.push(self.family.draw(args, &self.event, rng));
            }
        }

        Ok(SampleArray::new(draw_shape(size, &dist_shape), values)?)
    }
}
