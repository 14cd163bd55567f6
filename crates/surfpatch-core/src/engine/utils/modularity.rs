use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One possible merge and its modularity gain.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    gain: f64,
    u: usize,
    v: usize,
}

impl Candidate {
    fn new(gain: f64, a: usize, b: usize) -> Self {
        Self {
            gain,
            u: a.min(b),
            v: a.max(b),
        }
    }
}

impl Ord for Candidate {
    // Highest gain first, then the smallest pair.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .gain
            .total_cmp(&self.gain)
            .then(self.u.cmp(&other.u))
            .then(self.v.cmp(&other.v))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Clauset–Newman–Moore greedy modularity maximisation.
///
/// `edges` are undirected `(a, b, weight)` triples over arbitrary node ids; a
/// repeated pair keeps its last weight. Self-loops add to node strength and
/// total weight but are never merge candidates. Communities are merged while
/// the best gain is non-negative, the community with the smaller index being
/// absorbed. The result lists every community with its members ascending,
/// largest community first.
pub fn greedy_modularity_communities(
    edges: &[(usize, usize, f64)],
    resolution: f64,
) -> Vec<Vec<usize>> {
    let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for &(a, b, w) in edges {
        weights.insert((a.min(b), a.max(b)), w);
    }
    let nodes: Vec<usize> = weights
        .keys()
        .flat_map(|&(a, b)| [a, b])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if nodes.is_empty() {
        return Vec::new();
    }
    let index: BTreeMap<usize, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    let total: f64 = weights.values().sum();
    let mut communities: Vec<Option<BTreeSet<usize>>> = nodes
        .iter()
        .map(|&n| Some(BTreeSet::from([n])))
        .collect();
    if total <= 0.0 {
        return collect(communities);
    }

    let mut strength = vec![0.0; nodes.len()];
    for (&(a, b), &w) in &weights {
        strength[index[&a]] += w;
        strength[index[&b]] += w;
    }
    let mut fraction: Vec<f64> = strength.iter().map(|s| s / (2.0 * total)).collect();

    let mut gains: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); nodes.len()];
    let mut queue: BTreeSet<Candidate> = BTreeSet::new();
    for (&(a, b), &w) in &weights {
        if a == b {
            continue;
        }
        let (i, j) = (index[&a], index[&b]);
        let gain = w / total - 2.0 * resolution * fraction[i] * fraction[j];
        gains[i].insert(j, gain);
        gains[j].insert(i, gain);
        queue.insert(Candidate::new(gain, i, j));
    }

    while let Some(best) = queue.pop_first() {
        if best.gain < 0.0 {
            break;
        }
        let (u, v) = (best.u, best.v);

        let u_row = std::mem::take(&mut gains[u]);
        for (&w, &gain) in &u_row {
            queue.remove(&Candidate::new(gain, u, w));
            gains[w].remove(&u);
        }

        let targets: BTreeSet<usize> = u_row
            .keys()
            .chain(gains[v].keys())
            .copied()
            .filter(|&w| w != u && w != v)
            .collect();
        for w in targets {
            let updated = match (u_row.get(&w), gains[v].get(&w)) {
                (Some(&uw), Some(&vw)) => vw + uw,
                (None, Some(&vw)) => vw - 2.0 * resolution * fraction[u] * fraction[w],
                (Some(&uw), None) => uw - 2.0 * resolution * fraction[v] * fraction[w],
                (None, None) => continue,
            };
            if let Some(old) = gains[v].insert(w, updated) {
                queue.remove(&Candidate::new(old, v, w));
            }
            gains[w].insert(v, updated);
            queue.insert(Candidate::new(updated, v, w));
        }

        fraction[v] += fraction[u];
        fraction[u] = 0.0;
        if let Some(absorbed) = communities[u].take() {
            if let Some(target) = communities[v].as_mut() {
                target.extend(absorbed);
            }
        }
    }

    collect(communities)
}

fn collect(communities: Vec<Option<BTreeSet<usize>>>) -> Vec<Vec<usize>> {
    let mut result: Vec<Vec<usize>> = communities
        .into_iter()
        .flatten()
        .map(|c| c.into_iter().collect())
        .collect();
    result.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    result
}
