use arc_swap::ArcSwap;
use log::{debug, trace, warn};
use parking_lot::Mutex;
use riskvq_helpers::{DataSource, Float, Label, LabeledPoint, Point};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{BvqError, CodeVector, ConfusionMatrix, LearningRate, PowerDecay};

/// Snapshot of the code vectors of a classifier at one point in time.
pub type CodeVectors<F> = Arc<Vec<Arc<CodeVector<F>>>>;

/// The nearest code vector touched by the most recent training step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastUpdate {
    /// Index of the code vector in the current snapshot.
    pub index: usize,
    pub iteration: u64,
}

/// A Bayes Vector Quantizer.
///
/// Classifies a point with the label of its nearest code vector and trains
/// the code vectors with a risk-weighted stochastic gradient step on the
/// boundary between the two code vectors nearest to each training point.
///
/// A classifier is either built from a complete set of code vectors
/// ([`new`](Self::new)) or filled lazily up to a per-label quota
/// ([`with_quotas`](Self::with_quotas) followed by
/// [`add_code_vector`](Self::add_code_vector)). Training and prediction
/// fail with [`BvqError::NotReady`] until every quota is filled.
///
/// The code vectors live in an immutable snapshot that is swapped
/// atomically, so `nearest_two`, `predict` and `code_vectors` may run on
/// other threads while `add_code_vector` publishes new vectors; readers
/// always see a complete snapshot and never take a lock.
pub struct BvqClassifier<F: Float, S = PowerDecay<F>> {
    code_vectors: ArcSwap<Vec<Arc<CodeVector<F>>>>,
    quotas: Option<Mutex<HashMap<Label, usize>>>,
    pending: AtomicUsize,
    schedule: S,
    last_update: Option<LastUpdate>,
}

impl<F: Float> BvqClassifier<F> {
    /// A ready classifier over `code_vectors`.
    pub fn new(code_vectors: Vec<CodeVector<F>>) -> Self {
        BvqClassifier {
            code_vectors: ArcSwap::from_pointee(code_vectors.into_iter().map(Arc::new).collect()),
            quotas: None,
            pending: AtomicUsize::new(0),
            schedule: PowerDecay::default(),
            last_update: None,
        }
    }

    /// An empty classifier that becomes ready once `quotas[label]` code
    /// vectors have been added for every label.
    pub fn with_quotas(quotas: HashMap<Label, usize>) -> Self {
        BvqClassifier {
            code_vectors: ArcSwap::from_pointee(Vec::new()),
            pending: AtomicUsize::new(quotas.values().sum()),
            quotas: Some(Mutex::new(quotas)),
            schedule: PowerDecay::default(),
            last_update: None,
        }
    }
}

impl<F: Float, S: LearningRate<F>> BvqClassifier<F, S> {
    /// Replaces the learning-rate schedule.
    pub fn with_learning_rate<T: LearningRate<F>>(self, schedule: T) -> BvqClassifier<F, T> {
        BvqClassifier {
            code_vectors: self.code_vectors,
            quotas: self.quotas,
            pending: self.pending,
            schedule,
            last_update: self.last_update,
        }
    }

    pub fn learning_rate(&self, lr0: F, iteration: u64) -> F {
        self.schedule.rate(lr0, iteration)
    }

    /// True once every quota is filled, or when no quotas were configured.
    pub fn is_ready(&self) -> bool {
        self.pending() == 0
    }

    /// Number of code vectors still missing across all quotas.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Remaining quota of `label`, `None` when it has none.
    pub fn remaining_quota(&self, label: &Label) -> Option<usize> {
        self.quotas.as_ref()?.lock().get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.code_vectors.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current code vectors.
    pub fn code_vectors(&self) -> CodeVectors<F> {
        self.code_vectors.load_full()
    }

    pub fn last_update(&self) -> Option<LastUpdate> {
        self.last_update
    }

    fn ensure_ready(&self) -> Result<(), BvqError> {
        match self.pending() {
            0 => Ok(()),
            pending => Err(BvqError::NotReady { pending }),
        }
    }

    /// The nearest and second-nearest code vectors to `point`.
    ///
    /// On equal distances the code vector met first wins.
    pub fn nearest_two(
        &self,
        point: &Point<F>,
    ) -> Result<(Arc<CodeVector<F>>, Arc<CodeVector<F>>), BvqError> {
        let snapshot = self.code_vectors.load();
        let (first, second) = nearest_pair(&snapshot, point)?;
        Ok((snapshot[first].clone(), snapshot[second].clone()))
    }

    /// A single training step.
    ///
    /// Updates the two code vectors nearest to `point` and returns whether
    /// the update applied (see [`CodeVector::update`]).
    pub fn train(
        &mut self,
        point: &LabeledPoint<F>,
        lr0: F,
        iteration: u64,
        delta: F,
    ) -> Result<bool, BvqError> {
        self.ensure_ready()?;
        let learning_rate = self.schedule.rate(lr0, iteration);

        // `&mut self` excludes every reader of this classifier, so the
        // snapshot can be taken out and modified in place. `make_mut` only
        // copies when a caller still holds an older snapshot.
        let mut snapshot = self.code_vectors.swap(Arc::new(Vec::new()));
        let outcome = train_on(Arc::make_mut(&mut snapshot).as_mut_slice(), point, learning_rate, delta);
        self.code_vectors.store(snapshot);

        let (index, updated) = outcome?;
        self.last_update = Some(LastUpdate { index, iteration });
        if !updated {
            trace!("iteration {}: no update around code vector {}", iteration, index);
        }
        Ok(updated)
    }

    /// Runs `max_iterations` training steps, each on a point drawn with
    /// replacement from `source`. Returns the number of applied updates.
    pub fn fit<D: DataSource<F>>(
        &mut self,
        source: &mut D,
        lr0: F,
        max_iterations: u64,
        delta: F,
    ) -> Result<u64, BvqError> {
        let found = self.len();
        if found < 2 {
            return Err(BvqError::NotEnoughCodeVectors { found });
        }
        self.ensure_ready()?;
        debug!(
            "fitting {} code vectors for {} iterations (lr0 = {:?}, delta = {:?})",
            found, max_iterations, lr0, delta
        );

        let mut updates = 0;
        for i in 0..max_iterations {
            let point = source.draw(false)?;
            if self.train(&point, lr0, i, delta)? {
                updates += 1;
            }
        }

        if updates == 0 && max_iterations > 0 {
            warn!("no training point fell within delta/2 of a decision boundary");
        }
        debug!("fit done: {} of {} steps updated", updates, max_iterations);
        Ok(updates)
    }

    /// Label of the code vector nearest to `point`.
    pub fn predict(&self, point: &Point<F>) -> Result<Label, BvqError> {
        self.ensure_ready()?;
        let snapshot = self.code_vectors.load();
        let (first, _) = nearest_pair(&snapshot, point)?;
        Ok(snapshot[first].label().clone())
    }

    /// Predicts every point and records the outcome in `matrix`.
    pub fn evaluate(
        &self,
        points: &[LabeledPoint<F>],
        matrix: &mut ConfusionMatrix,
    ) -> Result<(), BvqError> {
        for p in points {
            let predicted = self.predict(p.point())?;
            matrix.add_result(p.label(), &predicted);
        }
        Ok(())
    }

    /// Adds `cv` if its label still has quota left.
    ///
    /// Returns `Ok(false)`, changing nothing, when the quota is exhausted.
    pub fn add_code_vector(&self, cv: CodeVector<F>) -> Result<bool, BvqError> {
        let quotas = self.quotas.as_ref().ok_or(BvqError::QuotasNotConfigured)?;
        let mut quotas = quotas.lock();
        let remaining = quotas
            .get_mut(cv.label())
            .ok_or_else(|| BvqError::UnknownLabel(cv.label().name().to_string()))?;
        if *remaining == 0 {
            return Ok(false);
        }

        let cv = Arc::new(cv);
        self.code_vectors.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(cv.clone());
            next
        });
        *remaining -= 1;
        // published before the counter drops, so a ready classifier always
        // sees its last code vector
        self.pending.fetch_sub(1, Ordering::AcqRel);
        Ok(true)
    }

    /// Drops every code vector and starts filling `quotas` again.
    pub fn reset_code_vectors(&mut self, quotas: HashMap<Label, usize>) {
        self.code_vectors.store(Arc::new(Vec::new()));
        self.pending = AtomicUsize::new(quotas.values().sum());
        self.quotas = Some(Mutex::new(quotas));
        self.last_update = None;
    }
}

impl<F: Float, S> Debug for BvqClassifier<F, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BvqClassifier")
            .field("code_vectors", &**self.code_vectors.load())
            .field("quotas", &self.quotas)
            .field("pending", &self.pending)
            .field("last_update", &self.last_update)
            .finish_non_exhaustive()
    }
}

/// Indices of the nearest and second-nearest code vectors.
fn nearest_pair<F: Float>(
    vectors: &[Arc<CodeVector<F>>],
    point: &Point<F>,
) -> Result<(usize, usize), BvqError> {
    let found = vectors.len();
    if found < 2 {
        return Err(BvqError::NotEnoughCodeVectors { found });
    }

    let mut nearest: [Option<usize>; 2] = [None, None];
    let mut distances = [F::infinity(); 2];
    for (i, cv) in vectors.iter().enumerate() {
        let d = cv.position().euclidean_distance(point)?;
        if d < distances[0] {
            distances[1] = distances[0];
            nearest[1] = nearest[0];
            distances[0] = d;
            nearest[0] = Some(i);
        } else if d < distances[1] {
            distances[1] = d;
            nearest[1] = Some(i);
        }
    }

    match nearest {
        [Some(first), Some(second)] => Ok((first, second)),
        _ => Err(BvqError::InvalidDistance),
    }
}

fn train_on<F: Float>(
    vectors: &mut [Arc<CodeVector<F>>],
    point: &LabeledPoint<F>,
    learning_rate: F,
    delta: F,
) -> Result<(usize, bool), BvqError> {
    let (first, second) = nearest_pair(vectors, point.point())?;
    let (nearest, runner_up) = pair_mut(vectors, first, second);
    let updated = Arc::make_mut(nearest).update(Arc::make_mut(runner_up), point, learning_rate, delta)?;
    Ok((first, updated))
}

/// Mutable references to two distinct slots of `items`.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (head, tail) = items.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use riskvq_helpers::{PointError, VecDataSource};
    use std::thread;

    fn labels() -> (Label, Label) {
        let a = Label::new("A");
        let b = Label::new("B");
        (a.clone().with_risk(&b, 1.0), b.with_risk(&a, 1.0))
    }

    fn cv(features: &[f64], label: &Label) -> CodeVector<f64> {
        CodeVector::new(LabeledPoint::new(ndarray::Array1::from_vec(features.to_vec()), label.clone()))
    }

    fn make_simple_data(a: &Label, b: &Label) -> Vec<LabeledPoint<f64>> {
        vec![
            LabeledPoint::new(array![0.0, 0.0], a.clone()),
            LabeledPoint::new(array![0.1, 0.2], a.clone()),
            LabeledPoint::new(array![0.2, 0.1], a.clone()),
            LabeledPoint::new(array![1.0, 1.0], b.clone()),
            LabeledPoint::new(array![1.1, 1.2], b.clone()),
            LabeledPoint::new(array![1.2, 1.1], b.clone()),
        ]
    }

    #[test]
    fn test_nearest_two() {
        let (a, b) = labels();
        let bvq = BvqClassifier::new(vec![
            cv(&[0.0], &a),
            cv(&[5.0], &b),
            cv(&[1.0], &b),
            cv(&[2.5], &a),
        ]);
        let (first, second) = bvq.nearest_two(&Point::new(array![1.4])).unwrap();
        assert_eq!(first.position(), &Point::new(array![1.0]));
        assert_eq!(second.position(), &Point::new(array![2.5]));
    }

    #[test]
    fn test_nearest_two_ties_keep_first_seen() {
        let (a, b) = labels();
        let bvq = BvqClassifier::new(vec![
            cv(&[-1.0], &a),
            cv(&[1.0], &b),
            cv(&[1.0], &a),
            cv(&[-1.0], &b),
        ]);
        let (first, second) = bvq.nearest_two(&Point::new(array![0.0])).unwrap();
        assert_eq!(first.label(), &a);
        assert_eq!(first.position(), &Point::new(array![-1.0]));
        assert_eq!(second.label(), &b);
        assert_eq!(second.position(), &Point::new(array![1.0]));
    }

    #[test]
    fn test_needs_two_code_vectors() {
        let (a, _) = labels();
        let mut bvq = BvqClassifier::new(vec![cv(&[0.0], &a)]);
        let p = LabeledPoint::new(array![1.0], a.clone());
        let expected = BvqError::NotEnoughCodeVectors { found: 1 };
        assert_eq!(bvq.nearest_two(p.point()).unwrap_err(), expected);
        assert_eq!(bvq.predict(p.point()).unwrap_err(), expected);
        assert_eq!(bvq.train(&p, 0.1, 0, 1.0).unwrap_err(), expected);

        let mut source = VecDataSource::seeded(vec![p], 0);
        assert_eq!(bvq.fit(&mut source, 0.1, 10, 1.0).unwrap_err(), expected);
    }

    #[test]
    fn test_dimension_mismatch() {
        let (a, b) = labels();
        let bvq = BvqClassifier::new(vec![cv(&[0.0, 0.0], &a), cv(&[1.0, 1.0], &b)]);
        assert_eq!(
            bvq.predict(&Point::new(array![0.5])).unwrap_err(),
            BvqError::Point(PointError::DimensionMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn test_train_worked_example() {
        let (a, b) = labels();
        let mut bvq = BvqClassifier::new(vec![cv(&[10.0], &b), cv(&[0.0], &a)]);
        let p = LabeledPoint::new(array![4.0], a.clone());

        assert!(bvq.train(&p, 0.1, 0, 3.0).unwrap());
        assert_eq!(bvq.last_update(), Some(LastUpdate { index: 1, iteration: 0 }));

        let snapshot = bvq.code_vectors();
        assert_abs_diff_eq!(snapshot[1].position().features()[0], 0.1 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(snapshot[0].position().features()[0], 10.0 + 0.1 / 6.0, epsilon = 1e-12);

        // delta = 1: the point is 1.0 from the boundary, outside delta/2
        let before = bvq.code_vectors();
        assert!(!bvq.train(&p, 0.1, 0, 1.0).unwrap());
        assert_eq!(*bvq.code_vectors(), *before);
    }

    #[test]
    fn test_train_keeps_older_snapshots_intact() {
        let (a, b) = labels();
        let mut bvq = BvqClassifier::new(vec![cv(&[0.0], &a), cv(&[10.0], &b)]);
        let held = bvq.code_vectors();
        let p = LabeledPoint::new(array![4.0], a.clone());
        assert!(bvq.train(&p, 0.1, 0, 3.0).unwrap());
        assert_eq!(held[0].position(), &Point::new(array![0.0]));
        assert_ne!(bvq.code_vectors()[0].position(), &Point::new(array![0.0]));
    }

    #[test]
    fn test_train_uses_schedule() {
        let (a, b) = labels();
        let p = LabeledPoint::new(array![4.0], a.clone());

        let mut decayed = BvqClassifier::new(vec![cv(&[0.0], &a), cv(&[10.0], &b)]);
        decayed.train(&p, 0.1, 100, 3.0).unwrap();
        let expected = 0.1 * 100f64.powf(-0.51) / 30.0 * 5.0;
        assert_abs_diff_eq!(decayed.code_vectors()[0].position().features()[0], expected, epsilon = 1e-12);

        let mut constant = BvqClassifier::new(vec![cv(&[0.0], &a), cv(&[10.0], &b)])
            .with_learning_rate(|lr0: f64, _: u64| lr0);
        constant.train(&p, 0.1, 100, 3.0).unwrap();
        assert_abs_diff_eq!(constant.code_vectors()[0].position().features()[0], 0.1 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_and_predict() {
        let (a, b) = labels();
        let data = make_simple_data(&a, &b);
        let mut bvq = BvqClassifier::new(vec![cv(&[0.4, 0.4], &a), cv(&[0.8, 0.8], &b)]);
        let mut source = VecDataSource::seeded(data.clone(), 42);

        bvq.fit(&mut source, 0.1, 2000, 0.5).unwrap();

        assert_eq!(bvq.predict(&Point::new(array![0.05, 0.05])).unwrap(), a);
        assert_eq!(bvq.predict(&Point::new(array![1.1, 1.05])).unwrap(), b);

        let mut matrix = ConfusionMatrix::new();
        bvq.evaluate(&data, &mut matrix).unwrap();
        assert_eq!(matrix.accuracy(), 1.0);
    }

    #[test]
    fn test_costly_class_gains_territory() {
        // misclassifying the rare class is expensive, so its region grows
        let common = Label::new("common");
        let rare = Label::new("rare");
        let common = common.with_risk(&rare, 0.1);
        let rare = rare.with_risk(&common, 1.0);

        let data = vec![
            LabeledPoint::new(array![4.0], common.clone()),
            LabeledPoint::new(array![4.5], rare.clone()),
            LabeledPoint::new(array![5.5], common.clone()),
            LabeledPoint::new(array![6.0], rare.clone()),
        ];
        let mut bvq = BvqClassifier::new(vec![cv(&[0.0], &common), cv(&[10.0], &rare)]);
        let mut source = VecDataSource::seeded(data, 3);
        let updates = bvq.fit(&mut source, 0.5, 500, 4.0).unwrap();
        assert!(updates > 0);

        let snapshot = bvq.code_vectors();
        let boundary = (snapshot[0].position().features()[0] + snapshot[1].position().features()[0]) / 2.0;
        assert!(boundary < 5.0, "boundary moved to {}", boundary);
    }

    #[test]
    fn test_add_code_vector_quota() {
        let (a, b) = labels();
        let mut quotas = HashMap::new();
        quotas.insert(a.clone(), 1);
        quotas.insert(b.clone(), 0);
        let bvq = BvqClassifier::<f64>::with_quotas(quotas);

        assert!(!bvq.add_code_vector(cv(&[1.0], &b)).unwrap());
        assert_eq!(bvq.len(), 0);
        assert_eq!(bvq.remaining_quota(&b), Some(0));

        assert!(bvq.add_code_vector(cv(&[0.0], &a)).unwrap());
        assert_eq!(bvq.len(), 1);
        assert_eq!(bvq.remaining_quota(&a), Some(0));

        assert!(!bvq.add_code_vector(cv(&[2.0], &a)).unwrap());
        assert_eq!(bvq.len(), 1);
    }

    #[test]
    fn test_add_code_vector_errors() {
        let (a, b) = labels();
        let ready = BvqClassifier::new(vec![cv(&[0.0], &a), cv(&[1.0], &b)]);
        assert_eq!(
            ready.add_code_vector(cv(&[2.0], &a)).unwrap_err(),
            BvqError::QuotasNotConfigured
        );

        let mut quotas = HashMap::new();
        quotas.insert(a.clone(), 1);
        let lazy = BvqClassifier::with_quotas(quotas);
        assert_eq!(
            lazy.add_code_vector(cv(&[2.0], &Label::new("C"))).unwrap_err(),
            BvqError::UnknownLabel("C".into())
        );
        assert_eq!(lazy.len(), 0);
    }

    #[test]
    fn test_readiness_any_interleaving() {
        let (a, b) = labels();
        let orders: [[&Label; 3]; 3] = [[&a, &a, &b], [&a, &b, &a], [&b, &a, &a]];
        for order in orders {
            let mut quotas = HashMap::new();
            quotas.insert(a.clone(), 2);
            quotas.insert(b.clone(), 1);
            let mut bvq = BvqClassifier::<f64>::with_quotas(quotas);
            let p = LabeledPoint::new(array![0.5], a.clone());

            for (k, label) in order.iter().enumerate() {
                assert!(!bvq.is_ready());
                assert_eq!(bvq.predict(p.point()).unwrap_err(), BvqError::NotReady { pending: 3 - k });
                assert!(bvq.add_code_vector(cv(&[k as f64], label)).unwrap());
            }
            assert!(bvq.is_ready());
            assert!(bvq.train(&p, 0.1, 0, 1.0).is_ok());
            assert!(bvq.predict(p.point()).is_ok());
        }
    }

    #[test]
    fn test_not_ready_blocks_training() {
        let (a, _) = labels();
        let mut quotas = HashMap::new();
        quotas.insert(a.clone(), 2);
        let mut bvq = BvqClassifier::<f64>::with_quotas(quotas);
        bvq.add_code_vector(cv(&[0.0], &a)).unwrap();
        let p = LabeledPoint::new(array![0.5], a.clone());
        assert_eq!(bvq.train(&p, 0.1, 0, 1.0).unwrap_err(), BvqError::NotReady { pending: 1 });
    }

    #[test]
    fn test_reset_code_vectors() {
        let (a, b) = labels();
        let mut bvq = BvqClassifier::new(vec![cv(&[0.0], &a), cv(&[1.0], &b)]);
        let mut quotas = HashMap::new();
        quotas.insert(a.clone(), 1);
        bvq.reset_code_vectors(quotas);
        assert!(bvq.is_empty());
        assert!(!bvq.is_ready());
        assert!(bvq.add_code_vector(cv(&[0.0], &a)).unwrap());
        assert!(bvq.is_ready());
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let (a, b) = labels();
        let mut quotas = HashMap::new();
        quotas.insert(a.clone(), 200);
        quotas.insert(b.clone(), 200);
        let bvq = BvqClassifier::<f64>::with_quotas(quotas);
        let query = Point::new(array![0.0, 0.0]);

        thread::scope(|s| {
            s.spawn(|| {
                for k in 0..200 {
                    let x = k as f64;
                    assert!(bvq.add_code_vector(cv(&[x, x], &a)).unwrap());
                    assert!(bvq.add_code_vector(cv(&[-x - 0.5, 0.0], &b)).unwrap());
                }
            });
            s.spawn(|| {
                let mut last_len = 0;
                while !bvq.is_ready() {
                    let snapshot = bvq.code_vectors();
                    assert!(snapshot.len() >= last_len);
                    assert!(snapshot.iter().all(|cv| cv.position().dim() == 2));
                    last_len = snapshot.len();
                    if snapshot.len() >= 2 {
                        assert!(bvq.nearest_two(&query).is_ok());
                    }
                }
                assert_eq!(bvq.len(), 400);
            });
        });

        assert_eq!(bvq.predict(&query).unwrap(), a);
    }
}
