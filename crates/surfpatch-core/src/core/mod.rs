//! # Core Module
//!
//! Stateless building blocks shared by the analysis engines: the structure
//! model, file readers, computational geometry, and residue/atom lookup tables.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Atoms, residues, chains, and the [`models::structure::Structure`] store
//! - **Computational Geometry** ([`geometry`]) - Orientation predicates and 3-D Delaunay tetrahedralization
//! - **File I/O** ([`io`]) - Readers for PDB coordinates, predicted aligned error matrices, and conservation scores
//! - **Lookup Tables** ([`utils`]) - Van der Waals radii and atom/residue classification
//!
//! Nothing in this layer keeps state between calls; the [`crate::engine`] layer
//! owns every mutable analysis state.

pub mod geometry;
pub mod io;
pub mod models;
pub mod utils;
