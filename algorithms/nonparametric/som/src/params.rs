use riskvq_helpers::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Hyper-parameters of [`SomGrid::fit`](crate::SomGrid::fit).
///
/// At iteration `t` the learning rate is `learning_rate * exp(-t / alpha)`
/// and the neighborhood radius is `sigma * exp(-t / beta)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct SomParams<F: Float> {
    pub max_iterations: u64,
    /// Initial learning rate.
    pub learning_rate: F,
    /// Initial neighborhood radius, in grid cells. Zero trains only the
    /// best-matching unit.
    pub sigma: F,
    /// Decay constant of the learning rate.
    pub alpha: F,
    /// Decay constant of the neighborhood radius.
    pub beta: F,
}

impl<F: Float> SomParams<F> {
    /// Both decay constants default to `max_iterations`.
    pub fn new(max_iterations: u64, learning_rate: F, sigma: F) -> Self {
        let horizon = F::from_f64_lossy(max_iterations as f64);
        SomParams { max_iterations, learning_rate, sigma, alpha: horizon, beta: horizon }
    }

    pub fn with_decay(mut self, alpha: F, beta: F) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn learning_rate_at(&self, t: u64) -> F {
        decay(self.learning_rate, t, self.alpha)
    }

    pub fn sigma_at(&self, t: u64) -> F {
        decay(self.sigma, t, self.beta)
    }
}

impl<F: Float> Default for SomParams<F> {
    fn default() -> Self {
        SomParams::new(200_000, F::from_f64_lossy(0.1), F::from_f64_lossy(0.1))
    }
}

fn decay<F: Float>(initial: F, t: u64, constant: F) -> F {
    if t == 0 {
        return initial;
    }
    initial * (-F::from_f64_lossy(t as f64) / constant).exp()
}
