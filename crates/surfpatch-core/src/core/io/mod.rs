//! Readers for the inputs of an analysis run.
//!
//! - [`pdb`] parses PDB coordinates into a cleaned [`crate::core::models::structure::Structure`].
//! - [`pae`] parses predicted aligned error matrices in the AlphaFold JSON layouts.
//! - [`conservation`] parses per-residue conservation scores from JSON or CSV.

pub mod conservation;
pub mod pae;
pub mod pdb;
pub mod traits;
