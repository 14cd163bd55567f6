use crate::core::models::residue::ResidueKey;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Names one analysis unit: a chain, or one domain of a chain.
///
/// Domains are numbered from 1; a chain analysed without domain splitting is
/// domain 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    pub chain: char,
    pub domain: usize,
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chain, self.domain)
    }
}

/// Why the patch iterations of a unit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All requested iterations ran.
    IterationLimit,
    /// No eligible residue had an eligible neighbour left.
    EmptyGraph,
    /// The eigen-solver failed to converge.
    NoConvergence,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::IterationLimit => "iteration limit reached",
            StopReason::EmptyGraph => "null graph",
            StopReason::NoConvergence => "no convergence",
        })
    }
}

/// Everything the centrality engine knows about one residue of a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueRecord {
    /// Absent when the residue is not accessible; such residues are never eligible.
    pub accessibility: Option<f64>,
    /// Spatial neighbours, ascending.
    pub direct_neighbors: Vec<ResidueKey>,
    pub conservation: Option<f64>,
    /// Centrality score per iteration (1-based), for iterations that included the residue.
    pub scores: BTreeMap<usize, f64>,
}

impl Serialize for ResidueRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(accessibility) = self.accessibility {
            map.serialize_entry("accessibility", &accessibility)?;
        }
        map.serialize_entry("direct_neighbors", &self.direct_neighbors)?;
        if let Some(conservation) = self.conservation {
            map.serialize_entry("conservation", &conservation)?;
        }
        for (iteration, score) in &self.scores {
            map.serialize_entry(&format!("score_{iteration}"), score)?;
        }
        map.end()
    }
}

/// Per-unit state threaded through the patch iterations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitState {
    pub residues: BTreeMap<ResidueKey, ResidueRecord>,
    /// Patches in discovery order; `patches[k - 1]` is patch k.
    pub patches: Vec<Vec<ResidueKey>>,
    pub stop_reason: Option<StopReason>,
}

impl UnitState {
    pub fn new(residues: BTreeMap<ResidueKey, ResidueRecord>) -> Self {
        Self {
            residues,
            ..Self::default()
        }
    }

    pub fn patch(&self, iteration: usize) -> Option<&[ResidueKey]> {
        iteration
            .checked_sub(1)
            .and_then(|i| self.patches.get(i))
            .map(Vec::as_slice)
    }
}

impl Serialize for UnitState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("residues", &self.residues)?;
        for (i, patch) in self.patches.iter().enumerate() {
            map.serialize_entry(&format!("patch_{}", i + 1), patch)?;
        }
        if let Some(reason) = &self.stop_reason {
            map.serialize_entry("stop_reason", reason)?;
        }
        map.end()
    }
}

/// Residues already claimed by earlier patches of the same unit.
#[derive(Debug, Clone, Default)]
pub struct PatchState {
    excluded: HashSet<ResidueKey>,
}

impl PatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_excluded(&self, key: &ResidueKey) -> bool {
        self.excluded.contains(key)
    }

    pub fn exclude(&mut self, patch: &[ResidueKey]) {
        self.excluded.extend(patch.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}
