use ndarray::{NdFloat, ScalarOperand};

use num_traits::{FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, MulAssign, SubAssign};

// Include submodules
mod error;
mod factory;
mod label;
mod labeled;
mod point;
mod source;

// Re-export types from submodules
pub use error::{PointError, SourceError};
pub use factory::{BasicPointFactory, PointFactory};
pub use label::{Label, DEFAULT_RISK};
pub use labeled::LabeledPoint;
pub use point::Point;
pub use source::{DataSource, VecDataSource};

/// Numeric type of a feature.
///
/// Implemented for `f32` and `f64`; every point, prototype and hyper-parameter
/// in the workspace is generic over it.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }

    /// Converts an `f64` (risks, iteration counts, defaults) into this type,
    /// rounding when `Self` is narrower.
    fn from_f64_lossy(x: f64) -> Self;

    fn half() -> Self {
        Self::one() / (Self::one() + Self::one())
    }
}

impl Float for f32 {
    fn from_f64_lossy(x: f64) -> Self {
        x as f32
    }
}

impl Float for f64 {
    fn from_f64_lossy(x: f64) -> Self {
        x
    }
}
