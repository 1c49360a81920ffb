use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use std::fmt::{Display, Formatter};

use crate::{Float, PointError};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A fixed-dimension feature vector.
///
/// `sum`, `subtract` and `product` accumulate into the receiver and hand it
/// back, so several steps can be chained on one buffer:
///
/// ```
/// use ndarray::array;
/// use riskvq_helpers::Point;
///
/// let mut p = Point::new(array![1.0, 2.0]);
/// p.subtract(&Point::new(array![1.0, 0.0])).unwrap().product(0.5);
/// assert_eq!(p, Point::new(array![0.0, 1.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Point<F: Float> {
    features: Array1<F>,
}

impl<F: Float> Point<F> {
    pub fn new(features: Array1<F>) -> Self {
        Point { features }
    }

    pub fn zeros(dim: usize) -> Self {
        Point { features: Array1::zeros(dim) }
    }

    pub fn from_vec(features: Vec<F>) -> Self {
        Point { features: Array1::from_vec(features) }
    }

    /// Number of features.
    #[inline]
    pub fn dim(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn features(&self) -> ArrayView1<'_, F> {
        self.features.view()
    }

    #[inline]
    pub fn features_mut(&mut self) -> ArrayViewMut1<'_, F> {
        self.features.view_mut()
    }

    pub fn into_features(self) -> Array1<F> {
        self.features
    }

    fn check_dim(&self, other: &Point<F>) -> Result<(), PointError> {
        if self.dim() != other.dim() {
            return Err(PointError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(())
    }

    /// Element-wise `self += other`.
    pub fn sum(&mut self, other: &Point<F>) -> Result<&mut Self, PointError> {
        self.check_dim(other)?;
        self.features += &other.features;
        Ok(self)
    }

    /// Element-wise `self -= other`.
    pub fn subtract(&mut self, other: &Point<F>) -> Result<&mut Self, PointError> {
        self.check_dim(other)?;
        self.features -= &other.features;
        Ok(self)
    }

    /// Scales every feature by `scalar`.
    pub fn product(&mut self, scalar: F) -> &mut Self {
        self.features *= scalar;
        self
    }

    /// Half-way point between `self` and `other`. Neither operand changes.
    pub fn middle_point(&self, other: &Point<F>) -> Result<Point<F>, PointError> {
        let mut middle = self.clone();
        middle.sum(other)?.product(F::half());
        Ok(middle)
    }

    pub fn scalar_product(&self, other: &Point<F>) -> Result<F, PointError> {
        self.check_dim(other)?;
        Ok(self.features.dot(&other.features))
    }

    pub fn squared_distance(&self, other: &Point<F>) -> Result<F, PointError> {
        self.check_dim(other)?;
        Ok(self
            .features
            .iter()
            .zip(other.features.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum())
    }

    pub fn euclidean_distance(&self, other: &Point<F>) -> Result<F, PointError> {
        Ok(self.squared_distance(other)?.sqrt())
    }

    /// L2 norm.
    pub fn norm(&self) -> F {
        self.features.dot(&self.features).sqrt()
    }

    /// Maps every feature into `[0, 1]` given its `(min, max)` pair.
    ///
    /// A feature whose min equals its max divides by zero; the table is the
    /// caller's responsibility.
    pub fn normalize(&mut self, min_max: &[(F, F)]) -> Result<(), PointError> {
        if min_max.len() != self.dim() {
            return Err(PointError::MinMaxTableMismatch {
                features: self.dim(),
                entries: min_max.len(),
            });
        }
        self.features
            .iter_mut()
            .zip(min_max)
            .for_each(|(x, &(min, max))| *x = (*x - min) / (max - min));
        Ok(())
    }
}

impl<F: Float> From<Array1<F>> for Point<F> {
    fn from(features: Array1<F>) -> Self {
        Point::new(features)
    }
}

impl<F: Float> AsRef<Point<F>> for Point<F> {
    fn as_ref(&self) -> &Point<F> {
        self
    }
}

impl<F: Float> Display for Point<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.features)
    }
}
