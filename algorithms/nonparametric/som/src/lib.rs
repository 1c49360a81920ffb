//! Square Self-Organizing Maps used to seed [`bvq`] classifiers.
//!
//! A [`SomGrid`] is trained on the points of one class, then flattened into
//! code vectors of that class with [`SomGrid::to_code_vectors`]. The code
//! vectors of several grids are merged with [`bvq::union_code_vectors`]
//! into the initial prototypes of a [`bvq::BvqClassifier`].

mod error;
mod grid;
mod params;

pub use error::SomError;
pub use grid::SomGrid;
pub use params::SomParams;
