use super::ids::ResidueId;
use super::residue::{ParseResidueKeyError, ResidueKey};
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An atom record as read from a structure file.
///
/// Only the properties consumed by the surface and domain analyses are kept:
/// the atom name, its position, its B-factor (which carries pLDDT for predicted
/// models), and the element symbol when the file provides one.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "OG1").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The temperature factor column; per-residue confidence for predicted models.
    pub b_factor: f64,
    /// Occupancy of this conformer; decides between alternate locations.
    pub occupancy: f64,
    /// Element symbol from columns 77-78, if present.
    pub element: Option<String>,
    /// Serial number as written in the source file.
    pub serial: usize,
}

impl Atom {
    /// Creates a new `Atom` with full occupancy, a zero B-factor and no element symbol.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            residue_id,
            position,
            b_factor: 0.0,
            occupancy: 1.0,
            element: None,
            serial: 0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseAtomLabelError {
    #[error("atom label '{0}' must have the form <residue>_<residue name>_<atom name>")]
    WrongFieldCount(String),
    #[error("atom label '{label}' has an invalid residue key: {source}")]
    InvalidResidueKey {
        label: String,
        #[source]
        source: ParseResidueKeyError,
    },
    #[error("atom label '{0}' has an empty residue or atom name")]
    EmptyName(String),
}

/// Identifies one atom for the accessibility engine.
///
/// The textual form is `<residue key>_<residue name>_<atom name>`, for
/// example `42_SER_OG` or `100A_GLY_CA`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomLabel {
    pub residue_key: ResidueKey,
    pub residue_name: String,
    pub atom_name: String,
}

impl AtomLabel {
    pub fn new(residue_key: ResidueKey, residue_name: &str, atom_name: &str) -> Self {
        Self {
            residue_key,
            residue_name: residue_name.to_string(),
            atom_name: atom_name.to_string(),
        }
    }
}

impl fmt::Display for AtomLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.residue_key, self.residue_name, self.atom_name
        )
    }
}

impl FromStr for AtomLabel {
    type Err = ParseAtomLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        let [key, residue_name, atom_name] = parts.as_slice() else {
            return Err(ParseAtomLabelError::WrongFieldCount(s.to_string()));
        };
        if residue_name.is_empty() || atom_name.is_empty() {
            return Err(ParseAtomLabelError::EmptyName(s.to_string()));
        }
        let residue_key =
            key.parse()
                .map_err(|source| ParseAtomLabelError::InvalidResidueKey {
                    label: s.to_string(),
                    source,
                })?;
        Ok(Self::new(residue_key, residue_name, atom_name))
    }
}
