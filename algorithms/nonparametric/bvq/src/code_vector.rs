use log::trace;
use riskvq_helpers::{Float, Label, LabeledPoint, Point, PointError};
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A labeled prototype. The code vectors of a classifier split feature
/// space into Voronoi regions, each predicting the label of its prototype.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct CodeVector<F: Float> {
    point: LabeledPoint<F>,
}

impl<F: Float> CodeVector<F> {
    pub fn new(point: LabeledPoint<F>) -> Self {
        CodeVector { point }
    }

    #[inline]
    pub fn point(&self) -> &LabeledPoint<F> {
        &self.point
    }

    #[inline]
    pub fn position(&self) -> &Point<F> {
        self.point.point()
    }

    #[inline]
    pub fn label(&self) -> &Label {
        self.point.label()
    }

    pub fn into_point(self) -> LabeledPoint<F> {
        self.point
    }

    /// Projects `point` onto the hyperplane that perpendicularly bisects the
    /// segment between `self` and `other`.
    ///
    /// Returns `Ok(None)` when the two code vectors coincide, since they then
    /// define no boundary.
    pub fn project(&self, other: &CodeVector<F>, point: &Point<F>) -> Result<Option<Point<F>>, PointError> {
        // normal of the decision surface
        let mut normal = self.position().clone();
        normal.subtract(other.position())?;

        let mut offset = self.position().middle_point(other.position())?;
        offset.subtract(point)?;

        let numerator = offset.scalar_product(&normal)?;
        let denominator = normal.scalar_product(&normal)?;
        if denominator == F::zero() {
            return Ok(None);
        }

        let mut projected = point.clone();
        projected.sum(normal.product(numerator / denominator))?;
        Ok(Some(projected))
    }

    /// One stochastic-gradient step of the risk-weighted update rule.
    ///
    /// `self` must be the code vector nearest to `training` and `other` the
    /// second nearest. Nothing moves unless `training` lies within `delta / 2`
    /// of their decision boundary. Otherwise `self` is pushed away from the
    /// projection of `training` and `other` pulled toward it, scaled by how
    /// much riskier misclassifying `training` as `other`'s class is than as
    /// `self`'s class.
    ///
    /// Returns whether the two code vectors were updated.
    pub fn update(
        &mut self,
        other: &mut CodeVector<F>,
        training: &LabeledPoint<F>,
        learning_rate: F,
        delta: F,
    ) -> Result<bool, PointError> {
        let Some(projection) = self.project(other, training.point())? else {
            trace!("code vectors {} and {} coincide, skipping update", self, other);
            return Ok(false);
        };

        let mut residual = training.point().clone();
        residual.subtract(&projection)?;
        // a NaN residual or delta is never inside the window
        let inside = residual.norm() <= delta * F::half();
        if !inside {
            return Ok(false);
        }

        let boundary_norm = self.position().euclidean_distance(other.position())?;
        let label = training.label();
        let risk_gap = F::from_f64_lossy(label.risk(other.label()))
            - F::from_f64_lossy(label.risk(self.label()));
        let beta = learning_rate * risk_gap / (delta * boundary_norm);

        let mut away = self.position().clone();
        away.subtract(&projection)?.product(beta);
        let mut toward = other.position().clone();
        toward.subtract(&projection)?.product(beta);

        self.point.point_mut().subtract(&away)?;
        other.point.point_mut().sum(&toward)?;
        Ok(true)
    }
}

impl<F: Float> Display for CodeVector<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CodeVector{{features={}, class={}}}", self.position(), self.label())
    }
}

impl<F: Float> From<LabeledPoint<F>> for CodeVector<F> {
    fn from(point: LabeledPoint<F>) -> Self {
        CodeVector::new(point)
    }
}

/// Merges several code-vector sets, keeping the first copy of every
/// duplicate (same label and same position).
pub fn union_code_vectors<F, I>(sets: I) -> Vec<CodeVector<F>>
where
    F: Float,
    I: IntoIterator<Item = Vec<CodeVector<F>>>,
{
    let mut union: Vec<CodeVector<F>> = Vec::new();
    for cv in sets.into_iter().flatten() {
        if !union.contains(&cv) {
            union.push(cv);
        }
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};

    fn labels() -> (Label, Label) {
        let a = Label::new("A");
        let b = Label::new("B");
        (a.clone().with_risk(&b, 1.0), b.with_risk(&a, 1.0))
    }

    fn cv(x: f64, label: &Label) -> CodeVector<f64> {
        CodeVector::new(LabeledPoint::new(array![x], label.clone()))
    }

    #[test]
    fn test_project_onto_bisector() {
        let (a, b) = labels();
        let first = cv(0.0, &a);
        let second = cv(10.0, &b);
        let projected = first
            .project(&second, &Point::new(array![4.0]))
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(projected.features()[0], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_2d() {
        let (a, b) = labels();
        let first = CodeVector::new(LabeledPoint::new(array![0.0, 0.0], a));
        let second = CodeVector::new(LabeledPoint::new(array![2.0, 2.0], b));
        let projected = first
            .project(&second, &Point::new(array![0.0, 3.0]))
            .unwrap()
            .unwrap();
        // bisector is x + y = 2
        assert_abs_diff_eq!(projected.features()[0], -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(projected.features()[1], 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_project_coincident_code_vectors() {
        let (a, b) = labels();
        let first = cv(3.0, &a);
        let second = cv(3.0, &b);
        assert_eq!(first.project(&second, &Point::new(array![1.0])).unwrap(), None);
    }

    #[test]
    fn test_update_worked_example() {
        let (a, b) = labels();
        let mut first = cv(0.0, &a);
        let mut second = cv(10.0, &b);
        let training = LabeledPoint::new(array![4.0], a.clone());

        let updated = first.update(&mut second, &training, 0.1, 3.0).unwrap();

        assert!(updated);
        assert_abs_diff_eq!(first.position().features()[0], 0.1 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(second.position().features()[0], 10.0 + 0.1 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(first.position().features()[0], 0.01667, epsilon = 1e-5);
        assert_abs_diff_eq!(second.position().features()[0], 10.01667, epsilon = 1e-5);
    }

    #[test]
    fn test_update_rejected_outside_window() {
        let (a, b) = labels();
        let mut first = cv(0.0, &a);
        let mut second = cv(10.0, &b);
        let training = LabeledPoint::new(array![4.0], a.clone());

        let updated = first.update(&mut second, &training, 0.1, 1.0).unwrap();

        assert!(!updated);
        assert_eq!(first, cv(0.0, &a));
        assert_eq!(second, cv(10.0, &b));
    }

    #[test]
    fn test_update_rejects_nan_window() {
        let (a, b) = labels();
        let mut first = cv(0.0, &a);
        let mut second = cv(10.0, &b);
        let training = LabeledPoint::new(array![4.0], a.clone());
        assert!(!first.update(&mut second, &training, 0.1, f64::NAN).unwrap());

        let nan_point = LabeledPoint::new(array![f64::NAN], a.clone());
        assert!(!first.update(&mut second, &nan_point, 0.1, 3.0).unwrap());
        assert_eq!(first, cv(0.0, &a));
        assert_eq!(second, cv(10.0, &b));
    }

    #[test]
    fn test_update_with_equal_risks_does_not_move() {
        let a = Label::new("A");
        let b = Label::new("B").with_risk(&a, 0.0);
        let mut first = cv(0.0, &a);
        let mut second = cv(10.0, &a);
        let training = LabeledPoint::new(array![4.5], b);

        // both risks are zero: the update applies with a zero step
        assert!(first.update(&mut second, &training, 0.1, 3.0).unwrap());
        assert_eq!(first.position().features()[0], 0.0);
        assert_eq!(second.position().features()[0], 10.0);
    }

    #[test]
    fn test_update_coincident_code_vectors() {
        let (a, b) = labels();
        let mut first = cv(1.0, &a);
        let mut second = cv(1.0, &b);
        let training = LabeledPoint::new(array![1.0], a.clone());
        assert!(!first.update(&mut second, &training, 0.1, 3.0).unwrap());
    }

    #[test]
    fn test_update_dimension_mismatch() {
        let (a, b) = labels();
        let mut first = cv(0.0, &a);
        let mut second = cv(10.0, &b);
        let training = LabeledPoint::new(array![4.0, 1.0], a.clone());
        assert_eq!(
            first.update(&mut second, &training, 0.1, 3.0).unwrap_err(),
            PointError::DimensionMismatch { left: 1, right: 2 }
        );
    }

    #[test]
    fn test_update_f32() {
        let (a, b) = labels();
        let mut first = CodeVector::new(LabeledPoint::new(array![0.0f32], a.clone()));
        let mut second = CodeVector::new(LabeledPoint::new(array![10.0f32], b));
        let training = LabeledPoint::new(array![4.0f32], a);
        assert!(first.update(&mut second, &training, 0.1, 3.0).unwrap());
        assert_abs_diff_eq!(first.position().features()[0], 0.016_666_668, epsilon = 1e-6);
    }

    #[test]
    fn test_union_drops_duplicates() {
        let (a, b) = labels();
        let union = union_code_vectors(vec![
            vec![cv(0.0, &a), cv(1.0, &a)],
            vec![cv(1.0, &a), cv(1.0, &b), cv(0.0, &a)],
        ]);
        assert_eq!(union, vec![cv(0.0, &a), cv(1.0, &a), cv(1.0, &b)]);
    }

    proptest::proptest! {
        #[test]
        fn prop_projection_lies_on_boundary(
            coords in proptest::collection::vec(-100.0..100.0f64, 9),
        ) {
            let (a, b) = labels();
            let (x, rest) = coords.split_at(3);
            let (y, p) = rest.split_at(3);
            let first = CodeVector::new(LabeledPoint::new(Array1::from_vec(x.to_vec()), a));
            let second = CodeVector::new(LabeledPoint::new(Array1::from_vec(y.to_vec()), b));
            proptest::prop_assume!(first.position().euclidean_distance(second.position()).unwrap() > 1e-3);

            let projected = first.project(&second, &Point::from_vec(p.to_vec())).unwrap().unwrap();
            let to_first = projected.euclidean_distance(first.position()).unwrap();
            let to_second = projected.euclidean_distance(second.position()).unwrap();
            proptest::prop_assert!((to_first - to_second).abs() < 1e-6 * (1.0 + to_first));
        }
    }
}
