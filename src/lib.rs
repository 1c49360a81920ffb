//! Cost-sensitive vector quantization.
//!
//! Re-exports the point algebra and data sources of [`riskvq_helpers`], the
//! Bayes Vector Quantizer of [`bvq`] and the SOM seeding of [`som`].

pub use bvq::{
    BvqClassifier, BvqError, CodeVector, CodeVectors, ConfusionMatrix, LastUpdate, LearningRate,
    PowerDecay, random_code_vectors, union_code_vectors,
};
pub use riskvq_helpers::{
    BasicPointFactory, DEFAULT_RISK, DataSource, Float, Label, LabeledPoint, Point, PointError,
    PointFactory, SourceError, VecDataSource,
};
pub use som::{SomError, SomGrid, SomParams};
