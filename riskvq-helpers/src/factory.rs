use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::marker::PhantomData;

use crate::{Float, Label, LabeledPoint, Point};

/// Builds points for the algorithms, so grids and classifiers never
/// construct feature buffers themselves.
///
/// Everything except [`random_feature_value`](PointFactory::random_feature_value)
/// has a default. Matrices are row-major `Vec<Vec<_>>` of zeroed points.
pub trait PointFactory<F: Float> {
    fn new_feature_array(&self, n: usize) -> Array1<F> {
        Array1::zeros(n)
    }

    fn new_point(&self, features: Array1<F>) -> Point<F> {
        Point::new(features)
    }

    fn new_point_matrix(&self, rows: usize, cols: usize, dim: usize) -> Vec<Vec<Point<F>>> {
        (0..rows)
            .map(|_| {
                (0..cols)
                    .map(|_| self.new_point(self.new_feature_array(dim)))
                    .collect()
            })
            .collect()
    }

    fn new_labeled_point(&self, features: Array1<F>, label: Label) -> LabeledPoint<F> {
        LabeledPoint::new(features, label)
    }

    fn new_labeled_point_matrix(
        &self,
        rows: usize,
        cols: usize,
        dim: usize,
        label: &Label,
    ) -> Vec<Vec<LabeledPoint<F>>> {
        (0..rows)
            .map(|_| {
                (0..cols)
                    .map(|_| self.new_labeled_point(self.new_feature_array(dim), label.clone()))
                    .collect()
            })
            .collect()
    }

    /// Clones `point` and attaches `label` to the copy.
    fn with_label(&self, point: &Point<F>, label: Label) -> LabeledPoint<F> {
        LabeledPoint::from_point(point.clone(), label)
    }

    fn random_feature_value(&mut self) -> F;
}

/// Default factory: uniform random features in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct BasicPointFactory<F: Float> {
    rng: Xoshiro256PlusPlus,
    _float: PhantomData<F>,
}

impl<F: Float> BasicPointFactory<F> {
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    pub fn seeded(seed: u64) -> Self {
        BasicPointFactory {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            _float: PhantomData,
        }
    }
}

impl<F: Float> Default for BasicPointFactory<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> PointFactory<F> for BasicPointFactory<F> {
    fn random_feature_value(&mut self) -> F {
        self.rng.random_range(F::zero()..F::one())
    }
}
