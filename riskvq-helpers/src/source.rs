use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{Float, Label, LabeledPoint, PointError, SourceError};

/// Supplies labeled training points.
pub trait DataSource<F: Float> {
    /// Draws a random point. With `without_replacement` the point is not
    /// drawn again until the source refills.
    fn draw(&mut self, without_replacement: bool) -> Result<LabeledPoint<F>, SourceError>;

    /// Same as [`draw`](DataSource::draw), restricted to points labeled `label`.
    fn draw_with_label(
        &mut self,
        without_replacement: bool,
        label: &Label,
    ) -> Result<LabeledPoint<F>, SourceError>;

    /// Every point of the source, in insertion order.
    fn points(&self) -> &[LabeledPoint<F>];

    /// Makes every point drawable again.
    fn reset(&mut self);
}

/// An in-memory [`DataSource`].
///
/// Draws come from a pool of indices. Drawing without replacement removes
/// the index; once the pool runs dry (or holds nothing of a requested label)
/// it refills with every point.
#[derive(Debug, Clone)]
pub struct VecDataSource<F: Float> {
    points: Vec<LabeledPoint<F>>,
    pool: Vec<usize>,
    rng: Xoshiro256PlusPlus,
}

impl<F: Float> VecDataSource<F> {
    pub fn new(points: Vec<LabeledPoint<F>>) -> Self {
        Self::seeded(points, rand::random())
    }

    pub fn seeded(points: Vec<LabeledPoint<F>>, seed: u64) -> Self {
        let pool = (0..points.len()).collect();
        VecDataSource {
            points,
            pool,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distinct labels, in order of first appearance.
    pub fn labels(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = Vec::new();
        for p in &self.points {
            if !labels.contains(p.label()) {
                labels.push(p.label().clone());
            }
        }
        labels
    }

    /// Per-feature `(min, max)` over every point.
    pub fn min_max_table(&self) -> Result<Vec<(F, F)>, SourceError> {
        let first = self.points.first().ok_or(SourceError::Empty)?;
        let mut table: Vec<(F, F)> = first.point().features().iter().map(|&x| (x, x)).collect();
        for p in &self.points[1..] {
            let features = p.point().features();
            if features.len() != table.len() {
                return Err(PointError::DimensionMismatch {
                    left: table.len(),
                    right: features.len(),
                }
                .into());
            }
            for (bounds, &x) in table.iter_mut().zip(features.iter()) {
                if x < bounds.0 {
                    bounds.0 = x;
                }
                if x > bounds.1 {
                    bounds.1 = x;
                }
            }
        }
        Ok(table)
    }

    /// Normalizes every point into `[0, 1]` and returns the table used, so
    /// the same mapping can be applied to held-out points.
    pub fn normalize(&mut self) -> Result<Vec<(F, F)>, SourceError> {
        let table = self.min_max_table()?;
        for p in &mut self.points {
            p.point_mut().normalize(&table)?;
        }
        Ok(table)
    }

    fn take(&mut self, slot: usize, without_replacement: bool) -> LabeledPoint<F> {
        let index = if without_replacement {
            self.pool.swap_remove(slot)
        } else {
            self.pool[slot]
        };
        self.points[index].clone()
    }

    fn slots_labeled(&self, label: &Label) -> Vec<usize> {
        self.pool
            .iter()
            .enumerate()
            .filter(|&(_, &i)| self.points[i].label() == label)
            .map(|(slot, _)| slot)
            .collect()
    }
}

impl<F: Float> DataSource<F> for VecDataSource<F> {
    fn draw(&mut self, without_replacement: bool) -> Result<LabeledPoint<F>, SourceError> {
        if self.pool.is_empty() {
            self.reset();
        }
        if self.pool.is_empty() {
            return Err(SourceError::Empty);
        }
        let slot = self.rng.random_range(0..self.pool.len());
        Ok(self.take(slot, without_replacement))
    }

    fn draw_with_label(
        &mut self,
        without_replacement: bool,
        label: &Label,
    ) -> Result<LabeledPoint<F>, SourceError> {
        if self.points.is_empty() {
            return Err(SourceError::Empty);
        }
        let mut slots = self.slots_labeled(label);
        if slots.is_empty() {
            self.reset();
            slots = self.slots_labeled(label);
        }
        if slots.is_empty() {
            return Err(SourceError::NoPointsForLabel(label.name().to_string()));
        }
        let slot = slots[self.rng.random_range(0..slots.len())];
        Ok(self.take(slot, without_replacement))
    }

    fn points(&self) -> &[LabeledPoint<F>] {
        &self.points
    }

    fn reset(&mut self) {
        self.pool.clear();
        self.pool.extend(0..self.points.len());
    }
}
