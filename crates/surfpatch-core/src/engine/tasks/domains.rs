use crate::engine::config::DomainConfig;
use crate::engine::error::ValidationError;
use crate::engine::utils::modularity::greedy_modularity_communities;
use nalgebra::DMatrix;
use tracing::{debug, info, instrument, warn};

/// Splits a chain into structural domains from its predicted aligned error.
///
/// Residues are the 1-based indices of `pae`; `confidence[i]` belongs to
/// residue `i + 1`. Every ordered pair with an error below the cutoff whose
/// residues are both confident enough becomes an edge of weight
/// `1 / pae^power`. Communities found by greedy modularity maximisation that
/// reach the minimum size are returned, largest first.
///
/// An empty result means no usable domains; callers treat the chain as one
/// domain in that case.
#[instrument(skip_all, name = "domain_task", fields(residues = confidence.len()))]
pub fn run(
    pae: &DMatrix<f64>,
    confidence: &[f64],
    config: &DomainConfig,
) -> Result<Vec<Vec<usize>>, ValidationError> {
    let (rows, cols) = pae.shape();
    if rows != cols {
        return Err(ValidationError::NotSquare { rows, cols });
    }
    if confidence.len() != rows {
        return Err(ValidationError::LengthMismatch {
            what: "confidence values",
            expected: rows,
            found: confidence.len(),
        });
    }

    let confident: Vec<bool> = confidence
        .iter()
        .map(|&c| c >= config.min_confidence)
        .collect();

    let mut edges = Vec::new();
    let mut skipped = 0usize;
    for i in 0..rows {
        if !confident[i] {
            continue;
        }
        for j in 0..cols {
            let error = pae[(i, j)];
            if !confident[j] || !(error < config.pae_cutoff) {
                continue;
            }
            let weight = 1.0 / error.powf(config.pae_power);
            if !weight.is_finite() {
                skipped += 1;
                continue;
            }
            edges.push((i + 1, j + 1, weight));
        }
    }
    if skipped > 0 {
        warn!(
            skipped,
            "Skipped residue pairs whose error gives a non-finite edge weight."
        );
    }
    if edges.is_empty() {
        info!("No residue pair qualifies for the domain graph.");
        return Ok(Vec::new());
    }
    debug!(edges = edges.len(), "Domain graph built.");

    let communities = greedy_modularity_communities(&edges, config.resolution);
    let found = communities.len();
    let domains: Vec<Vec<usize>> = communities
        .into_iter()
        .filter(|c| c.len() >= config.min_domain_size)
        .collect();

    info!(
        communities = found,
        domains = domains.len(),
        "Domain detection finished."
    );
    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two blocks of residues with low error inside each block, a few
    /// moderately confident cross pairs and a zero diagonal.
    fn two_block_pae(first: usize, second: usize) -> DMatrix<f64> {
        let n = first + second;
        DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                0.0
            } else if (i < first) == (j < first) {
                1.0
            } else if (i, j) == (first - 1, first) || (i, j) == (first, first - 1) {
                4.0
            } else {
                20.0
            }
        })
    }

    #[test]
    fn low_confidence_everywhere_gives_no_domains() {
        let pae = DMatrix::from_element(3, 3, 1.0);
        let domains = run(&pae, &[50.0, 60.0, 69.9], &DomainConfig::default()).unwrap();
        assert!(domains.is_empty());
    }

    #[test]
    fn two_blocks_become_two_domains() {
        let pae = two_block_pae(35, 35);
        let confidence = vec![90.0; 70];

        let domains = run(&pae, &confidence, &DomainConfig::default()).unwrap();

        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0], (1..=35).collect::<Vec<_>>());
        assert_eq!(domains[1], (36..=70).collect::<Vec<_>>());
    }

    #[test]
    fn small_communities_are_dropped() {
        let pae = two_block_pae(40, 10);
        let confidence = vec![90.0; 50];

        let domains = run(&pae, &confidence, &DomainConfig::default()).unwrap();

        assert_eq!(domains, vec![(1..=40).collect::<Vec<_>>()]);
    }

    #[test]
    fn domains_are_disjoint_and_large_enough() {
        let pae = two_block_pae(33, 31);
        let mut confidence = vec![90.0; 64];
        confidence[5] = 20.0;
        let config = DomainConfig::default();

        let domains = run(&pae, &confidence, &config).unwrap();

        let mut seen = std::collections::HashSet::new();
        for domain in &domains {
            assert!(domain.len() >= config.min_domain_size);
            for &residue in domain {
                assert!(seen.insert(residue), "residue {residue} in two domains");
            }
        }
        assert!(!seen.contains(&6));
    }

    #[test]
    fn shape_errors_are_reported() {
        let rect = DMatrix::from_element(2, 3, 1.0);
        assert_eq!(
            run(&rect, &[90.0, 90.0], &DomainConfig::default()),
            Err(ValidationError::NotSquare { rows: 2, cols: 3 })
        );

        let square = DMatrix::from_element(3, 3, 1.0);
        assert_eq!(
            run(&square, &[90.0, 90.0], &DomainConfig::default()),
            Err(ValidationError::LengthMismatch {
                what: "confidence values",
                expected: 3,
                found: 2,
            })
        );
    }
}
