//! Computational geometry used by the accessibility engine.
//!
//! The engine only needs one capability from this module: turning a cloud of
//! atom positions into a list of tetrahedra whose circumspheres are empty.
//! That capability sits behind [`GeometryProvider`] so that alternative
//! tetrahedralizers can be plugged in; [`delaunay::BowyerWatson`] is the
//! built-in implementation.

pub mod delaunay;
pub mod predicates;

use nalgebra::Point3;
use thiserror::Error;

/// Four point indices, in no particular order.
pub type Tetrahedron = [usize; 4];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("At least 4 points are required for a tetrahedralization, got {0}")]
    TooFewPoints(usize),
    #[error("Point {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("Degenerate point set: {0}")]
    Degenerate(String),
    #[error("Tetrahedralization became inconsistent: {0}")]
    Inconsistent(String),
}

/// Produces a Delaunay tetrahedralization of a 3-D point set.
pub trait GeometryProvider {
    /// Tetrahedralizes `points`.
    ///
    /// Every returned tetrahedron references indices into `points`. Exactly
    /// duplicated points are tolerated; only the first copy is used.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewPoints`] for fewer than four points and
    /// [`GeometryError::Degenerate`] when all points are coplanar.
    fn tetrahedralize(&self, points: &[Point3<f64>]) -> Result<Vec<Tetrahedron>, GeometryError>;
}
