use super::error::WorkflowError;
use crate::core::geometry::delaunay::BowyerWatson;
use crate::core::models::structure::Structure;
use crate::engine::config::PeelingConfig;
use crate::engine::state::UnitId;
use crate::engine::tasks::accessibility::{self, AccessibilityReport};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Accessibility and neighbours for every chain, or only for `chain`.
///
/// Unlike the full analysis a chain that cannot be meshed fails the whole call.
#[instrument(skip_all, name = "surface_workflow")]
pub fn run(
    structure: &Structure,
    chain: Option<char>,
    config: &PeelingConfig,
) -> Result<BTreeMap<char, AccessibilityReport>, WorkflowError> {
    if structure.residue_count() == 0 {
        return Err(WorkflowError::EmptyStructure);
    }
    if let Some(id) = chain {
        if structure.find_chain_by_id(id).is_none() {
            return Err(WorkflowError::UnknownChain(id));
        }
    }

    let provider = BowyerWatson::default();
    let mut reports = BTreeMap::new();
    for (chain_id, data) in structure.chains_iter() {
        if chain.is_some_and(|id| id != data.id) {
            continue;
        }
        let atoms = structure.unit_atoms(chain_id, None);
        let report = accessibility::run(&atoms.positions, &atoms.labels, &provider, config)
            .map_err(|source| WorkflowError::Unit {
                unit: UnitId {
                    chain: data.id,
                    domain: 1,
                },
                source,
            })?;
        info!(chain = %data.id, accessible = report.residues.len(), "Chain surface computed.");
        reports.insert(data.id, report);
    }
    Ok(reports)
}
