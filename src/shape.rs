//! Sample shapes and parameter broadcasting
//!
//! Draws follow numpy conventions: the output of `random(size)` has shape
//! `size ++ dist_shape`, where `dist_shape` is the variable's declared shape
//! or, when none is declared, the broadcast of its parameter shapes.
//!
//! Single-element dimensions are squeezed the way [`draw_shape`] describes:
//! a size of exactly `[1]` and a declared shape of `[1]` contribute nothing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("shapes {left:?} and {right:?} cannot be broadcast together")]
    Incompatible { left: Vec<usize>, right: Vec<usize> },

    #[error("data of length {len} does not fill shape {shape:?}")]
    LengthMismatch { shape: Vec<usize>, len: usize },
}

/// Requested number of independent draws
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Size {
    /// A single draw; no leading dimensions
    #[default]
    Scalar,
    Length(usize),
    Shape(Vec<usize>),
}

impl Size {
    /// Leading dimensions contributed by this size
    pub fn dims(&self) -> Vec<usize> {
        match self {
            Size::Scalar => Vec::new(),
            Size::Length(n) => vec![*n],
            Size::Shape(dims) => dims.clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.dims().iter().product()
    }
}

impl From<usize> for Size {
    fn from(n: usize) -> Self {
        Size::Length(n)
    }
}

impl From<Vec<usize>> for Size {
    fn from(dims: Vec<usize>) -> Self {
        Size::Shape(dims)
    }
}

/// Output shape of a draw of `size` from a variable of shape `dist_shape`
///
/// A size of one (`Length(1)` or `Shape([1])`) adds no leading dimension
/// and a `dist_shape` of `[1]` adds no trailing one, so both collapse to a
/// scalar draw. Other sizes keep their dimensions, `Length(n)` included.
///
/// ```
/// use distcheck::shape::{draw_shape, Size};
///
/// assert_eq!(draw_shape(&Size::Length(1), &[]), Vec::<usize>::new());
/// assert_eq!(draw_shape(&Size::Length(5), &[1]), vec![5]);
/// assert_eq!(draw_shape(&Size::Shape(vec![2, 1]), &[3]), vec![2, 1, 3]);
/// ```
pub fn draw_shape(size: &Size, dist_shape: &[usize]) -> Vec<usize> {
    let mut shape = match size.dims() {
        dims if dims == [1] => Vec::new(),
        dims => dims,
    };
    if dist_shape != [1] {
        shape.extend_from_slice(dist_shape);
    }
    shape
}

/// Broadcast two shapes, aligning trailing dimensions
pub fn broadcast_shapes(left: &[usize], right: &[usize]) -> Result<Vec<usize>, ShapeError> {
    let ndim = left.len().max(right.len());
    let mut out = vec![0; ndim];
    for i in 0..ndim {
        let l = dim_from_end(left, i);
        let r = dim_from_end(right, i);
        out[ndim - 1 - i] = match (l, r) {
            (a, b) if a == b => a,
            (1, b) => b,
            (a, 1) => a,
            _ => {
                return Err(ShapeError::Incompatible {
                    left: left.to_vec(),
                    right: right.to_vec(),
                })
            }
        };
    }
    Ok(out)
}

fn dim_from_end(shape: &[usize], i: usize) -> usize {
    if i < shape.len() {
        shape[shape.len() - 1 - i]
    } else {
        1
    }
}

/// Flat index into an array of `source` shape for the element at
/// `flat` in an array of the broadcast `target` shape.
///
/// `source` must be broadcast-compatible with `target`.
pub fn broadcast_index(source: &[usize], target: &[usize], mut flat: usize) -> usize {
    let mut index = 0;
    let mut stride = 1;
    for i in 0..target.len() {
        let t = target[target.len() - 1 - i];
        let coord = flat % t;
        flat /= t;
        if i < source.len() {
            let s = source[source.len() - 1 - i];
            if s != 1 {
                index += coord * stride;
            }
            stride *= s;
        }
    }
    index
}

/// Dense row-major array of samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleArray {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl SampleArray {
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Result<Self, ShapeError> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(ShapeError::LengthMismatch {
                shape,
                len: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Shape with scalars promoted to `[1]`
    pub fn atleast_1d_shape(&self) -> Vec<usize> {
        if self.shape.is_empty() {
            vec![1]
        } else {
            self.shape.clone()
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Flattened samples, consuming the array
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
