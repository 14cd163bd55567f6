/// Splits one-dimensional values into two clusters with Ward linkage.
///
/// Returns a label per input value: `1` for the cluster holding the largest
/// values, `0` for the other. On a line Ward linkage only ever merges
/// neighbouring clusters of the sorted values, so the agglomeration runs over
/// contiguous runs of the values sorted by `(value, index)`; ties between
/// equal merge costs go to the lowest run.
///
/// Two or more values always yield exactly two clusters. Tied values are
/// ordered by index, so `[x, x, x]` splits as `[0, 0, 1]`. A single value is
/// labelled `1`.
pub fn ward_two_clusters(values: &[f64]) -> Vec<usize> {
    let n = values.len();
    if n < 2 {
        return vec![1; n];
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));

    // (first sorted position, size, mean) per run.
    let mut runs: Vec<(usize, usize, f64)> = order
        .iter()
        .enumerate()
        .map(|(pos, &i)| (pos, 1, values[i]))
        .collect();

    while runs.len() > 2 {
        let mut best = 0;
        let mut best_cost = f64::INFINITY;
        for i in 0..runs.len() - 1 {
            let cost = merge_cost(runs[i], runs[i + 1]);
            if cost < best_cost {
                best_cost = cost;
                best = i;
            }
        }
        let (start, na, ma) = runs[best];
        let (_, nb, mb) = runs.remove(best + 1);
        let size = na + nb;
        runs[best] = (start, size, (ma * na as f64 + mb * nb as f64) / size as f64);
    }

    let split = runs[1].0;
    let mut labels = vec![0; n];
    for &i in &order[split..] {
        labels[i] = 1;
    }
    labels
}

fn merge_cost(a: (usize, usize, f64), b: (usize, usize, f64)) -> f64 {
    let (na, nb) = (a.1 as f64, b.1 as f64);
    let diff = a.2 - b.2;
    na * nb / (na + nb) * diff * diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_a_clear_gap() {
        let labels = ward_two_clusters(&[0.1, 0.9, 0.12, 0.95, 0.11]);
        assert_eq!(labels, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn single_outlier_forms_its_own_cluster() {
        let labels = ward_two_clusters(&[0.2, 0.21, 0.19, 0.2, 0.8]);
        assert_eq!(labels, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn equal_values_still_split_in_two() {
        assert_eq!(ward_two_clusters(&[0.5, 0.5]), vec![0, 1]);
        assert_eq!(ward_two_clusters(&[0.5, 0.5, 0.5]), vec![0, 0, 1]);
        assert_eq!(ward_two_clusters(&[0.4; 6]), vec![0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn tied_maxima_stay_together_when_a_gap_exists() {
        assert_eq!(ward_two_clusters(&[0.9, 0.1, 0.9]), vec![1, 0, 1]);
    }

    #[test]
    fn fewer_than_two_values() {
        assert_eq!(ward_two_clusters(&[0.3]), vec![1]);
        assert!(ward_two_clusters(&[]).is_empty());
    }

    #[test]
    fn two_values_split_in_two() {
        assert_eq!(ward_two_clusters(&[0.7, 0.1]), vec![1, 0]);
    }

    #[test]
    fn merge_minimises_variance_increase_not_gap() {
        // The upper gap is the narrower one, but the large upper group makes
        // joining it more expensive than joining the two lower values.
        let labels = ward_two_clusters(&[0.0, 1.0, 1.8, 1.8, 1.8, 1.8, 1.8, 1.8]);
        assert_eq!(labels, vec![0, 0, 1, 1, 1, 1, 1, 1]);
    }
}
