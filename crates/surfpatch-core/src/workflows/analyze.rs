use super::error::WorkflowError;
use crate::core::geometry::delaunay::BowyerWatson;
use crate::core::io::conservation::ConservationTable;
use crate::core::io::pae::PaeMatrix;
use crate::core::models::residue::ResidueKey;
use crate::core::models::structure::{Structure, UnitAtoms};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{ResidueRecord, StopReason, UnitId, UnitState};
use crate::engine::tasks::{accessibility, centrality};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result of one chain × domain unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UnitOutcome {
    Scored(UnitState),
    Failed { error: String },
}

impl UnitOutcome {
    pub fn state(&self) -> Option<&UnitState> {
        match self {
            UnitOutcome::Scored(state) => Some(state),
            UnitOutcome::Failed { .. } => None,
        }
    }
}

/// Per-chain, per-domain outcomes of an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    pub units: BTreeMap<char, BTreeMap<usize, UnitOutcome>>,
}

impl AnalysisResult {
    pub fn unit(&self, id: UnitId) -> Option<&UnitOutcome> {
        self.units.get(&id.chain)?.get(&id.domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &UnitOutcome)> {
        self.units.iter().flat_map(|(&chain, domains)| {
            domains
                .iter()
                .map(move |(&domain, outcome)| (UnitId { chain, domain }, outcome))
        })
    }

    pub fn failed_count(&self) -> usize {
        self.iter()
            .filter(|(_, outcome)| outcome.state().is_none())
            .count()
    }
}

/// Runs the full analysis on a structure.
///
/// When domain splitting is enabled and a PAE matrix is supplied every chain
/// is cut into the detected domains; if splitting is disabled, impossible or
/// finds nothing, each chain is one unit. A unit that cannot be analysed is
/// recorded as failed and the remaining units still run.
#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    structure: &Structure,
    conservation: &ConservationTable,
    pae: Option<&PaeMatrix>,
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<AnalysisResult, WorkflowError> {
    if structure.residue_count() == 0 {
        return Err(WorkflowError::EmptyStructure);
    }

    // === Phase 1: Domain splitting ===
    reporter.report(Progress::PhaseStart {
        name: "Domain Splitting",
    });
    let domains = resolve_domains(structure, pae, config);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Per-unit scoring ===
    reporter.report(Progress::PhaseStart {
        name: "Scoring Units",
    });
    let units = build_units(structure, &domains);
    info!(units = units.len(), "Analysis units prepared.");
    reporter.report(Progress::TaskStart {
        total_steps: units.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = units.iter();

    #[cfg(feature = "parallel")]
    let iterator = units.par_iter();

    let outcomes: Vec<(UnitId, UnitOutcome)> = iterator
        .map(|(unit, atoms)| {
            let outcome = match analyze_unit(*unit, atoms, conservation, config) {
                Ok(state) => {
                    reporter.report(Progress::UnitFinished {
                        unit: *unit,
                        patches: state.patches.len(),
                        stop_reason: state.stop_reason.unwrap_or(StopReason::IterationLimit),
                    });
                    UnitOutcome::Scored(state)
                }
                Err(e) => {
                    warn!(unit = %unit, error = %e, "Unit analysis failed.");
                    reporter.report(Progress::UnitFailed {
                        unit: *unit,
                        reason: e.to_string(),
                    });
                    UnitOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            reporter.report(Progress::TaskIncrement);
            (*unit, outcome)
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let mut result = AnalysisResult::default();
    for (unit, outcome) in outcomes {
        result
            .units
            .entry(unit.chain)
            .or_default()
            .insert(unit.domain, outcome);
    }

    info!(
        units = result.iter().count(),
        failed = result.failed_count(),
        "Analysis complete."
    );
    Ok(result)
}

/// Residue-number sets per domain, or an empty list for whole-chain units.
fn resolve_domains(
    structure: &Structure,
    pae: Option<&PaeMatrix>,
    config: &AnalysisConfig,
) -> Vec<BTreeSet<isize>> {
    let (Some(domain_config), Some(pae)) = (config.domains.as_ref(), pae) else {
        debug!("Domain splitting disabled or no PAE matrix; using whole chains.");
        return Vec::new();
    };

    match super::domains::run(structure, pae, domain_config) {
        Ok(domains) if domains.is_empty() => {
            info!("No domains found; using whole chains.");
            Vec::new()
        }
        Ok(domains) => {
            info!(domains = domains.len(), "Structure split into domains.");
            domains
                .into_iter()
                .map(|members| members.into_iter().map(|n| n as isize).collect())
                .collect()
        }
        Err(e) => {
            warn!(error = %e, "Domain splitting failed; using whole chains.");
            Vec::new()
        }
    }
}

fn build_units(structure: &Structure, domains: &[BTreeSet<isize>]) -> Vec<(UnitId, UnitAtoms)> {
    let mut units = Vec::new();
    for (chain_id, chain) in structure.chains_iter() {
        if domains.is_empty() {
            units.push((
                UnitId {
                    chain: chain.id,
                    domain: 1,
                },
                structure.unit_atoms(chain_id, None),
            ));
            continue;
        }
        for (i, members) in domains.iter().enumerate() {
            let atoms = structure.unit_atoms(chain_id, Some(members));
            let unit = UnitId {
                chain: chain.id,
                domain: i + 1,
            };
            if atoms.is_empty() {
                debug!(unit = %unit, "Chain has no residues in this domain.");
                continue;
            }
            units.push((unit, atoms));
        }
    }
    units
}

fn analyze_unit(
    unit: UnitId,
    atoms: &UnitAtoms,
    conservation: &ConservationTable,
    config: &AnalysisConfig,
) -> Result<UnitState, EngineError> {
    let report = accessibility::run(
        &atoms.positions,
        &atoms.labels,
        &BowyerWatson::default(),
        &config.peeling,
    )?;

    let keys: BTreeSet<ResidueKey> = atoms.labels.iter().map(|l| l.residue_key).collect();
    let residues = keys
        .into_iter()
        .map(|key| {
            let record = ResidueRecord {
                accessibility: report
                    .residues
                    .get(&key)
                    .map(|access| if access.any_atom { 1.0 } else { 0.0 }),
                direct_neighbors: report
                    .neighbors
                    .get(&key)
                    .map(|n| n.iter().copied().collect())
                    .unwrap_or_default(),
                conservation: conservation.lookup(unit.chain, &key),
                scores: BTreeMap::new(),
            };
            (key, record)
        })
        .collect();

    let mut state = UnitState::new(residues);
    centrality::run(&mut state, &config.centrality, unit);
    Ok(state)
}
