//! # surfpatch
//!
//! Identifies conserved, surface-exposed patches on protein structures.
//!
//! Given atomic coordinates and per-residue conservation scores, the library
//! finds which residues are solvent accessible (by peeling a Delaunay
//! tetrahedralization of the atoms), optionally splits the protein into
//! structural domains using predicted aligned error, and then repeatedly
//! extracts the most central, conserved patch of neighbouring surface residues.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split throughout.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `ResidueKey`,
//!   `AtomLabel`), the Delaunay geometry provider, lookup tables, and file readers.
//!
//! - **[`engine`]: The Logic Core.** The three analysis engines and the state they
//!   mutate: cavity peeling over the tetrahedral face table, PAE-based domain
//!   clustering by modularity, and iterative centrality-driven patch extraction.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together: builds
//!   analysis units (chain × domain), runs every engine per unit, and produces the
//!   serializable result consumed by the command-line tool.

pub mod core;
pub mod engine;
pub mod workflows;
