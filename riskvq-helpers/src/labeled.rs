use ndarray::Array1;

use crate::{Float, Label, Point};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A point with its class label.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct LabeledPoint<F: Float> {
    point: Point<F>,
    label: Label,
}

impl<F: Float> LabeledPoint<F> {
    pub fn new(features: Array1<F>, label: Label) -> Self {
        LabeledPoint { point: Point::new(features), label }
    }

    pub fn from_point(point: Point<F>, label: Label) -> Self {
        LabeledPoint { point, label }
    }

    #[inline]
    pub fn point(&self) -> &Point<F> {
        &self.point
    }

    #[inline]
    pub fn point_mut(&mut self) -> &mut Point<F> {
        &mut self.point
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    pub fn into_parts(self) -> (Point<F>, Label) {
        (self.point, self.label)
    }
}

impl<F: Float> AsRef<Point<F>> for LabeledPoint<F> {
    fn as_ref(&self) -> &Point<F> {
        &self.point
    }
}
