use thiserror::Error;

/// Errors raised by point algebra.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    /// The two operands of a binary operation have different dimensions.
    #[error("dimension mismatch: left operand has {left} features, right operand has {right}")]
    DimensionMismatch { left: usize, right: usize },
    /// A min/max normalization table does not hold one entry per feature.
    #[error("min/max table has {entries} entries but the point has {features} features")]
    MinMaxTableMismatch { features: usize, entries: usize },
}

/// Errors raised while drawing points from a data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The data source holds no points at all.
    #[error("data source is empty")]
    Empty,
    /// No point in the data source carries the requested label.
    #[error("no point labeled {0:?} in the data source")]
    NoPointsForLabel(String),
    #[error(transparent)]
    Point(#[from] PointError),
}
