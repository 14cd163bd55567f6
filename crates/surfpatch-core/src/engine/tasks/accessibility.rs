use crate::core::geometry::GeometryProvider;
use crate::core::models::atom::AtomLabel;
use crate::core::models::residue::ResidueKey;
use crate::core::utils::identifiers::is_backbone_atom;
use crate::core::utils::radii::vdw_radius;
use crate::engine::config::PeelingConfig;
use crate::engine::error::{EngineError, ValidationError};
use crate::engine::mesh::{Face, FaceTable};
use nalgebra::Point3;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

/// Accessibility of one residue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResidueAccessibility {
    #[serde(rename = "accessible_atms")]
    pub accessible_atoms: BTreeSet<String>,
    #[serde(rename = "any_atm_score", serialize_with = "flag_as_int")]
    pub any_atom: bool,
    #[serde(rename = "side_chain_score", serialize_with = "flag_as_int")]
    pub side_chain: bool,
}

fn flag_as_int<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessibilityReport {
    #[serde(rename = "accessible_residues")]
    pub residues: BTreeMap<ResidueKey, ResidueAccessibility>,
    #[serde(rename = "direct_neighbors")]
    pub neighbors: BTreeMap<ResidueKey, BTreeSet<ResidueKey>>,
}

impl AccessibilityReport {
    fn mark_accessible(&mut self, label: &AtomLabel) {
        let entry = self.residues.entry(label.residue_key).or_default();
        entry.accessible_atoms.insert(label.atom_name.clone());
        entry.any_atom = true;
        if !is_backbone_atom(&label.atom_name) {
            entry.side_chain = true;
        }
    }

    fn connect(&mut self, a: &AtomLabel, b: &AtomLabel) {
        if a.residue_key == b.residue_key {
            return;
        }
        self.neighbors
            .entry(a.residue_key)
            .or_default()
            .insert(b.residue_key);
        self.neighbors
            .entry(b.residue_key)
            .or_default()
            .insert(a.residue_key);
    }
}

/// Computes atom/residue accessibility and spatial neighbours for one unit.
///
/// The atoms are tetrahedralized, then tetrahedra behind open boundary faces
/// are peeled away until nothing changes. A face is open when at least one
/// of its three atom pairs leaves a surface-to-surface gap of
/// `config.probe_gap` or more. Atoms on the final boundary, or on any face
/// that was peeled away completely, are accessible. Residues sharing a final
/// boundary face are direct neighbours.
#[instrument(skip_all, name = "accessibility_task", fields(atoms = positions.len()))]
pub fn run<G: GeometryProvider + ?Sized>(
    positions: &[Point3<f64>],
    labels: &[AtomLabel],
    provider: &G,
    config: &PeelingConfig,
) -> Result<AccessibilityReport, EngineError> {
    if positions.len() != labels.len() {
        return Err(ValidationError::LengthMismatch {
            what: "atom labels",
            expected: positions.len(),
            found: labels.len(),
        }
        .into());
    }

    let tetrahedra = provider.tetrahedralize(positions)?;
    let mut table = FaceTable::build(&tetrahedra);

    if config.peel {
        let radii: Vec<f64> = labels
            .iter()
            .map(|label| vdw_radius(&label.residue_name, &label.atom_name))
            .collect();
        let gap = |a: usize, b: usize| (positions[a] - positions[b]).norm() - radii[a] - radii[b];
        let is_open = |face: &Face| {
            let [a, b, c] = *face;
            gap(a, b) >= config.probe_gap
                || gap(a, c) >= config.probe_gap
                || gap(b, c) >= config.probe_gap
        };

        let summary = table.peel(is_open);
        debug!(
            passes = summary.passes,
            eroded = summary.eroded,
            "Peeling converged."
        );
    }

    let mut report = AccessibilityReport::default();
    for face in table.faces().iter().filter(|f| f.count == 1 || f.removed) {
        for &atom in &face.atoms {
            report.mark_accessible(&labels[atom]);
        }
    }
    for face in table.boundary_faces() {
        let [a, b, c] = face.atoms.map(|atom| &labels[atom]);
        report.connect(a, b);
        report.connect(a, c);
        report.connect(b, c);
    }

    info!(
        accessible_residues = report.residues.len(),
        connected_residues = report.neighbors.len(),
        "Accessibility computed."
    );
    Ok(report)
}

/// Same as [`run`], with labels in their `<residue>_<name>_<atom>` text form.
pub fn run_with_wire_labels<G: GeometryProvider + ?Sized, L: AsRef<str>>(
    positions: &[Point3<f64>],
    labels: &[L],
    provider: &G,
    config: &PeelingConfig,
) -> Result<AccessibilityReport, EngineError> {
    let parsed = labels
        .iter()
        .map(|label| label.as_ref().parse::<AtomLabel>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(ValidationError::from)?;
    run(positions, &parsed, provider, config)
}
