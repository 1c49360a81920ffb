use riskvq_helpers::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Learning rate as a function of the initial rate and the iteration index.
///
/// Any `Fn(F, u64) -> F` closure is a schedule:
///
/// ```
/// use bvq::LearningRate;
///
/// let constant = |lr0: f64, _: u64| lr0;
/// assert_eq!(constant.rate(0.1, 1000), 0.1);
/// ```
pub trait LearningRate<F: Float> {
    fn rate(&self, lr0: F, iteration: u64) -> F;
}

impl<F, T> LearningRate<F> for T
where
    F: Float,
    T: Fn(F, u64) -> F,
{
    fn rate(&self, lr0: F, iteration: u64) -> F {
        self(lr0, iteration)
    }
}

/// `lr0 * i^exponent`, with `lr0` itself at iteration 0.
///
/// The default exponent of `-0.51` keeps the step sizes square-summable but
/// not summable.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct PowerDecay<F: Float> {
    pub exponent: F,
}

impl<F: Float> PowerDecay<F> {
    pub fn new(exponent: F) -> Self {
        PowerDecay { exponent }
    }
}

impl<F: Float> Default for PowerDecay<F> {
    fn default() -> Self {
        PowerDecay::new(F::from_f64_lossy(-0.51))
    }
}

impl<F: Float> LearningRate<F> for PowerDecay<F> {
    fn rate(&self, lr0: F, iteration: u64) -> F {
        if iteration == 0 {
            return lr0;
        }
        lr0 * F::from_f64_lossy(iteration as f64).powf(self.exponent)
    }
}
