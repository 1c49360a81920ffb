use riskvq_helpers::{PointError, SourceError};
use thiserror::Error;

/// Errors that can occur while searching, training or predicting with a
/// [`BvqClassifier`](crate::BvqClassifier).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BvqError {
    /// Searching or training needs at least two code vectors.
    #[error("at least 2 code vectors are required, found {found}")]
    NotEnoughCodeVectors { found: usize },
    /// No finite distance to the query point (likely NaN features).
    #[error("no finite distance between the point and the code vectors")]
    InvalidDistance,
    /// Some per-label quota has not been filled yet.
    #[error("classifier is not ready: {pending} code vectors still missing")]
    NotReady { pending: usize },
    /// `add_code_vector` was called on a classifier built without quotas.
    #[error("no per-label quotas configured, cannot add code vectors")]
    QuotasNotConfigured,
    /// The code vector's label has no configured quota.
    #[error("label {0:?} has no configured quota")]
    UnknownLabel(String),
    #[error(transparent)]
    Point(#[from] PointError),
    #[error(transparent)]
    Source(#[from] SourceError),
}
