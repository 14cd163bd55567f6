//! # Engine Module
//!
//! The three analysis engines and the state they share.
//!
//! - **Cavity peeling** ([`tasks::accessibility`]) turns a tetrahedral mesh of a
//!   unit's atoms into per-residue accessibility and a residue contact graph.
//! - **Domain splitting** ([`tasks::domains`]) groups the residues of a chain into
//!   structural domains from its predicted aligned error matrix.
//! - **Patch centrality** ([`tasks::centrality`]) ranks accessible, conserved
//!   residues by eigenvector centrality and extracts connected high-scoring
//!   patches, one per iteration.
//!
//! Supporting modules hold the configuration ([`config`]), per-unit state
//! ([`state`]), the face table used while peeling ([`mesh`]), progress reporting
//! ([`progress`]) and error types ([`error`]).

pub mod config;
pub mod error;
pub mod mesh;
pub mod progress;
pub mod state;
pub mod tasks;
pub(crate) mod utils;
