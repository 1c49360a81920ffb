//! Bayes Vector Quantization: a cost-sensitive prototype classifier.
//!
//! Labeled code vectors split feature space into decision regions. Training
//! moves the two code vectors nearest to a sample along a stochastic
//! gradient of the expected misclassification risk, using the per-label
//! risks configured on [`Label`](riskvq_helpers::Label).
//!
//! ```
//! use bvq::{BvqClassifier, CodeVector};
//! use ndarray::array;
//! use riskvq_helpers::{Label, LabeledPoint, Point};
//!
//! let healthy = Label::new("healthy");
//! let sick = Label::new("sick");
//! let healthy = healthy.with_risk(&sick, 0.2);
//! let sick = sick.with_risk(&healthy, 1.0);
//!
//! let mut bvq = BvqClassifier::new(vec![
//!     CodeVector::new(LabeledPoint::new(array![0.0], healthy.clone())),
//!     CodeVector::new(LabeledPoint::new(array![10.0], sick.clone())),
//! ]);
//! let sample = LabeledPoint::new(array![5.5], sick.clone());
//! bvq.train(&sample, 0.1, 0, 3.0).unwrap();
//!
//! assert_eq!(bvq.predict(&Point::new(array![1.0])).unwrap(), healthy);
//! ```

mod classifier;
mod code_vector;
mod error;
mod metrics;
mod schedule;
mod seed;

pub use classifier::{BvqClassifier, CodeVectors, LastUpdate};
pub use code_vector::{CodeVector, union_code_vectors};
pub use error::BvqError;
pub use metrics::{ConfusionMatrix, DEFAULT_WINDOW};
pub use schedule::{LearningRate, PowerDecay};
pub use seed::random_code_vectors;
