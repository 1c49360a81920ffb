use riskvq_helpers::{PointError, SourceError};
use thiserror::Error;

/// Errors that can occur while building or training a [`SomGrid`](crate::SomGrid).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SomError {
    #[error("number of clusters must have an integer square root, got {0}")]
    NotASquare(usize),
    #[error("a grid needs at least one cluster")]
    EmptyGrid,
    /// No finite distance to the query point (likely NaN features).
    #[error("no finite distance between the point and the prototypes")]
    InvalidDistance,
    #[error(transparent)]
    Point(#[from] PointError),
    #[error(transparent)]
    Source(#[from] SourceError),
}
