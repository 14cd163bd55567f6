use crate::core::models::residue::ResidueKey;
use crate::engine::config::CentralityConfig;
use crate::engine::state::{PatchState, StopReason, UnitId, UnitState};
use crate::engine::utils::clustering::ward_two_clusters;
use crate::engine::utils::eigen::dominant_eigenvector;
use nalgebra::DMatrix;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, info, instrument};

/// Directed, weighted graph over the residues eligible in one iteration.
#[derive(Debug, Default)]
struct IterationGraph {
    nodes: Vec<ResidueKey>,
    index: HashMap<ResidueKey, usize>,
    edges: HashMap<(usize, usize), f64>,
}

impl IterationGraph {
    fn build(state: &UnitState, patches: &PatchState, config: &CentralityConfig) -> Self {
        let eligible: BTreeSet<ResidueKey> = state
            .residues
            .iter()
            .filter(|(key, record)| {
                !patches.is_excluded(key)
                    && record
                        .accessibility
                        .is_some_and(|a| a > config.accessibility_threshold)
                    && record.conservation.is_some()
            })
            .map(|(key, _)| *key)
            .collect();

        let mut graph = Self::default();
        for target in &eligible {
            let record = &state.residues[target];
            let Some(conservation) = record.conservation else {
                continue;
            };
            let sources: Vec<ResidueKey> = record
                .direct_neighbors
                .iter()
                .filter(|n| eligible.contains(n))
                .copied()
                .collect();
            if sources.is_empty() {
                continue;
            }
            let weight = conservation / sources.len() as f64;
            for source in sources {
                let from = graph.insert(source);
                let to = graph.insert(*target);
                graph.edges.insert((from, to), weight);
            }
        }
        graph
    }

    fn insert(&mut self, key: ResidueKey) -> usize {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        self.nodes.push(key);
        self.index.insert(key, self.nodes.len() - 1);
        self.nodes.len() - 1
    }

    /// Matrix whose dominant eigenvector holds the in-edge centrality.
    fn centrality_matrix(&self) -> DMatrix<f64> {
        let n = self.nodes.len();
        let mut m = DMatrix::zeros(n, n);
        for (&(from, to), &weight) in &self.edges {
            m[(to, from)] = weight;
        }
        m
    }
}

/// Extracts up to `config.max_patches` patches from one unit.
///
/// Each iteration scores the eligible residues by eigenvector centrality,
/// splits the scores into two clusters and grows a patch from the best
/// residue through its high-scoring direct neighbours. Patch members are
/// excluded from later iterations. Scores and patches are written into
/// `state`; the returned reason is also stored in `state.stop_reason`.
#[instrument(skip_all, name = "centrality_task", fields(unit = %unit))]
pub fn run(state: &mut UnitState, config: &CentralityConfig, unit: UnitId) -> StopReason {
    let mut patches = PatchState::new();
    let mut reason = StopReason::IterationLimit;

    for iteration in 1..=config.max_patches {
        let graph = IterationGraph::build(state, &patches, config);
        if graph.nodes.is_empty() {
            reason = StopReason::EmptyGraph;
            info!(iteration, chain = %unit.chain, domain = unit.domain, "Stopping: {reason}.");
            break;
        }

        let scores = match dominant_eigenvector(
            &graph.centrality_matrix(),
            config.max_solver_iterations,
            config.solver_tolerance,
        ) {
            Ok(scores) => scores,
            Err(e) => {
                reason = StopReason::NoConvergence;
                info!(iteration, chain = %unit.chain, domain = unit.domain, error = %e, "Stopping: {reason}.");
                break;
            }
        };

        for (key, &score) in graph.nodes.iter().zip(scores.iter()) {
            if let Some(record) = state.residues.get_mut(key) {
                record.scores.insert(iteration, score);
            }
        }

        let seed = first_max(scores.as_slice());
        let labels = ward_two_clusters(scores.as_slice());
        let high: HashSet<ResidueKey> = graph
            .nodes
            .iter()
            .zip(&labels)
            .filter(|(_, label)| **label == labels[seed])
            .map(|(key, _)| *key)
            .collect();

        let patch = grow_patch(state, graph.nodes[seed], high);
        debug!(
            iteration,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            seed = %graph.nodes[seed],
            patch = patch.len(),
            "Patch extracted."
        );
        patches.exclude(&patch);
        state.patches.push(patch);
    }

    if reason == StopReason::IterationLimit {
        info!(iterations = config.max_patches, chain = %unit.chain, domain = unit.domain, "Stopping: {reason}.");
    }
    state.stop_reason = Some(reason);
    reason
}

fn first_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Breadth-first walk from `seed` over direct neighbours inside `pending`.
///
/// A residue leaves `pending` when it is queued, not when it is visited.
fn grow_patch(
    state: &UnitState,
    seed: ResidueKey,
    mut pending: HashSet<ResidueKey>,
) -> Vec<ResidueKey> {
    let mut patch = Vec::new();
    let mut queue = VecDeque::from([seed]);
    pending.remove(&seed);

    while let Some(current) = queue.pop_front() {
        patch.push(current);
        let Some(record) = state.residues.get(&current) else {
            continue;
        };
        for neighbor in &record.direct_neighbors {
            if pending.remove(neighbor) {
                queue.push_back(*neighbor);
            }
        }
    }
    patch
}
