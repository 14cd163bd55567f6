//! # Core Models Module
//!
//! Data structures describing a protein structure as it flows through the
//! accessibility, domain and centrality engines.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom records and the `<residue>_<name>_<atom>` label used as engine input
//! - [`residue`] - Residue keys (sequence number + insertion code) and residue records
//! - [`chain`] - Chain records
//! - [`structure`] - The slot-map backed [`structure::Structure`] store
//! - [`ids`] - Stable identifiers for atoms, residues, and chains
//!
//! ```ignore
//! use surfpatch::core::models::structure::Structure;
//! use surfpatch::core::models::residue::ResidueKey;
//!
//! let mut structure = Structure::new();
//! let chain_id = structure.add_chain('A');
//! let residue_id = structure.add_residue(chain_id, ResidueKey::new(1), "ALA")?;
//! structure.add_atom_to_residue(residue_id, Atom::new("CA", residue_id, Point3::origin()))?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
