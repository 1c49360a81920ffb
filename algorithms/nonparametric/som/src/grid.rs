use bvq::CodeVector;
use log::{debug, warn};
use ndarray::Array2;
use riskvq_helpers::{DataSource, Float, Label, LabeledPoint, Point, PointFactory};

use crate::{SomError, SomParams};

/// A square Self-Organizing Map.
///
/// Holds `n × n` prototypes, stored row-major, where `n²` is the requested
/// number of clusters. Prototypes are pulled toward training points with a
/// Gaussian neighborhood over grid coordinates around the best-matching unit.
#[derive(Debug, Clone)]
pub struct SomGrid<F: Float, P: PointFactory<F>> {
    factory: P,
    n: usize,
    prototypes: Vec<Point<F>>,
}

impl<F: Float, P: PointFactory<F>> SomGrid<F, P> {
    /// A grid whose features are drawn from `factory.random_feature_value()`.
    pub fn random(mut factory: P, clusters: usize, n_features: usize) -> Result<Self, SomError> {
        let n = grid_side(clusters)?;
        let mut prototypes = Vec::with_capacity(clusters);
        for row in factory.new_point_matrix(n, n, n_features) {
            for mut p in row {
                p.features_mut().map_inplace(|x| *x = factory.random_feature_value());
                prototypes.push(p);
            }
        }
        Ok(SomGrid { factory, n, prototypes })
    }

    /// A grid whose prototypes are copies of points drawn from `source`,
    /// restricted to `label` when given.
    pub fn from_source<D: DataSource<F>>(
        factory: P,
        clusters: usize,
        source: &mut D,
        label: Option<&Label>,
    ) -> Result<Self, SomError> {
        let n = grid_side(clusters)?;
        let prototypes = (0..clusters)
            .map(|_| draw(source, label).map(|p| factory.new_point(p.into_parts().0.into_features())))
            .collect::<Result<_, _>>()?;
        Ok(SomGrid { factory, n, prototypes })
    }

    /// Side length `n` of the grid.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Prototypes in row-major order.
    pub fn prototypes(&self) -> &[Point<F>] {
        &self.prototypes
    }

    pub fn prototype(&self, i: usize, j: usize) -> Option<&Point<F>> {
        if i < self.n && j < self.n {
            self.prototypes.get(i * self.n + j)
        } else {
            None
        }
    }

    /// Grid cell of the prototype nearest to `point`. Ties keep the first
    /// cell in row-major order.
    pub fn best_matching_unit(&self, point: &Point<F>) -> Result<(usize, usize), SomError> {
        let mut best = None;
        let mut best_dist = F::infinity();
        for (k, proto) in self.prototypes.iter().enumerate() {
            let d = proto.euclidean_distance(point)?;
            if d < best_dist {
                best_dist = d;
                best = Some(k);
            }
        }
        let best = best.ok_or(SomError::InvalidDistance)?;
        Ok((best / self.n, best % self.n))
    }

    /// Online training for `params.max_iterations` steps, one point drawn
    /// with replacement per step (restricted to `label` when given).
    pub fn fit<D: DataSource<F>>(
        &mut self,
        source: &mut D,
        label: Option<&Label>,
        params: &SomParams<F>,
    ) -> Result<(), SomError> {
        debug!(
            "training {0}x{0} SOM for {1} iterations (lr0 = {2:?}, sigma0 = {3:?}, label = {4:?})",
            self.n, params.max_iterations, params.learning_rate, params.sigma, label
        );
        let two = F::one() + F::one();
        let mut collapsed = false;

        for t in 0..params.max_iterations {
            let lr = params.learning_rate_at(t);
            let sigma = params.sigma_at(t);
            if !collapsed && t > 0 && (lr == F::zero() || sigma == F::zero()) {
                warn!("SOM decay collapsed at iteration {} (lr = {:?}, sigma = {:?})", t, lr, sigma);
                collapsed = true;
            }

            let sample = draw(source, label)?;
            let (bi, bj) = self.best_matching_unit(sample.point())?;

            for (k, proto) in self.prototypes.iter_mut().enumerate() {
                let (i, j) = (k / self.n, k % self.n);
                let weight = if sigma == F::zero() {
                    if (i, j) != (bi, bj) {
                        continue;
                    }
                    F::one()
                } else {
                    let di = F::from_f64_lossy(i as f64 - bi as f64);
                    let dj = F::from_f64_lossy(j as f64 - bj as f64);
                    (-(di * di + dj * dj) / (two * sigma * sigma)).exp()
                };

                let mut step = sample.point().clone();
                step.subtract(proto)?.product(lr * weight);
                proto.sum(&step)?;
            }
        }

        debug!("SOM training done after {} iterations", params.max_iterations);
        Ok(())
    }

    /// Every prototype, row-major, as a code vector labeled `label`.
    pub fn to_code_vectors(&self, label: &Label) -> Vec<CodeVector<F>> {
        self.prototypes
            .iter()
            .map(|p| CodeVector::new(self.factory.with_label(p, label.clone())))
            .collect()
    }

    /// Number of `points` whose best-matching unit is each cell.
    pub fn distribution(&self, points: &[LabeledPoint<F>]) -> Result<Array2<usize>, SomError> {
        let mut counts = Array2::zeros((self.n, self.n));
        for p in points {
            counts[self.best_matching_unit(p.point())?] += 1;
        }
        Ok(counts)
    }

    /// Sum of distances from each point to its best-matching prototype.
    pub fn cohesion(&self, points: &[LabeledPoint<F>]) -> Result<F, SomError> {
        let mut cohesion = F::zero();
        for p in points {
            let (i, j) = self.best_matching_unit(p.point())?;
            cohesion += self.prototypes[i * self.n + j].euclidean_distance(p.point())?;
        }
        Ok(cohesion)
    }

    /// Sum of distances over every ordered pair of distinct prototypes.
    pub fn separation(&self) -> Result<F, SomError> {
        let mut separation = F::zero();
        for (a, pa) in self.prototypes.iter().enumerate() {
            for (b, pb) in self.prototypes.iter().enumerate() {
                if a != b {
                    separation += pa.euclidean_distance(pb)?;
                }
            }
        }
        Ok(separation)
    }
}

fn grid_side(clusters: usize) -> Result<usize, SomError> {
    if clusters == 0 {
        return Err(SomError::EmptyGrid);
    }
    let n = clusters.isqrt();
    if n * n != clusters {
        return Err(SomError::NotASquare(clusters));
    }
    Ok(n)
}

fn draw<F: Float, D: DataSource<F>>(
    source: &mut D,
    label: Option<&Label>,
) -> Result<LabeledPoint<F>, SomError> {
    let point = match label {
        Some(label) => source.draw_with_label(false, label)?,
        None => source.draw(false)?,
    };
    Ok(point)
}
