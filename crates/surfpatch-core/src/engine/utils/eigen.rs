use nalgebra::{DMatrix, DVector, Schur};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("Schur decomposition did not converge within {0} iterations")]
    SchurDiverged(usize),
    #[error("Inverse iteration did not converge within {0} iterations")]
    NotConverged(usize),
    #[error("Shifted matrix is singular")]
    Singular,
}

/// Relative offset of the inverse-iteration shift from the eigenvalue.
const SHIFT_OFFSET: f64 = 1e-10;

/// Dominant eigenvector of `matrix`, the eigenvector belonging to the
/// eigenvalue with the largest real part.
///
/// The eigenvalue comes from a real Schur decomposition allowed
/// `max_iterations` QR sweeps per eigenvalue; the vector from
/// shifted inverse iteration started at the all-ones vector. Convergence is
/// declared once the L1 change between iterates drops below
/// `n * tolerance`. The result has unit Euclidean length and a non-negative
/// component sum.
pub fn dominant_eigenvector(
    matrix: &DMatrix<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<DVector<f64>, SolverError> {
    let n = matrix.nrows();
    if n == 0 {
        return Ok(DVector::zeros(0));
    }

    let schur_cap = max_iterations.saturating_mul(n);
    let schur = Schur::try_new(matrix.clone(), f64::EPSILON, schur_cap)
        .ok_or(SolverError::SchurDiverged(schur_cap))?;
    let lambda = schur
        .complex_eigenvalues()
        .iter()
        .map(|z| z.re)
        .fold(f64::NEG_INFINITY, f64::max);

    let sigma = lambda + lambda.abs().max(1.0) * SHIFT_OFFSET;
    let shifted = matrix - DMatrix::identity(n, n) * sigma;
    let lu = shifted.lu();

    let mut x = normalize(DVector::from_element(n, 1.0));
    for iteration in 1..=max_iterations {
        let y = lu.solve(&x).ok_or(SolverError::Singular)?;
        if !y.iter().all(|v| v.is_finite()) {
            return Err(SolverError::Singular);
        }
        let next = normalize(y);
        let change: f64 = (&next - &x).abs().sum();
        x = next;
        if change < n as f64 * tolerance {
            trace!(iteration, lambda, "Inverse iteration converged.");
            return Ok(x);
        }
    }
    Err(SolverError::NotConverged(max_iterations))
}

fn normalize(v: DVector<f64>) -> DVector<f64> {
    let norm = v.norm();
    if norm == 0.0 {
        return v;
    }
    let sign = if v.sum() < 0.0 { -1.0 } else { 1.0 };
    v / (sign * norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &DVector<f64>, b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6, "{a} != {b:?}");
        }
    }

    #[test]
    fn symmetric_pair_has_uniform_vector() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let v = dominant_eigenvector(&m, 1000, 1e-9).unwrap();
        let h = 1.0 / 2.0_f64.sqrt();
        assert_close(&v, &[h, h]);
    }

    #[test]
    fn star_centre_dominates() {
        // Star with centre 0 and three leaves: eigenvalue sqrt(3).
        let mut m = DMatrix::zeros(4, 4);
        for leaf in 1..4 {
            m[(0, leaf)] = 1.0;
            m[(leaf, 0)] = 1.0;
        }
        let v = dominant_eigenvector(&m, 1000, 1e-9).unwrap();
        let centre = 3.0_f64.sqrt();
        let norm = (centre * centre + 3.0).sqrt();
        assert_close(&v, &[centre / norm, 1.0 / norm, 1.0 / norm, 1.0 / norm]);
    }

    #[test]
    fn bipartite_graph_converges_despite_negative_eigenvalue() {
        // Path of three nodes has eigenvalues -sqrt2, 0, sqrt2; power iteration
        // would oscillate, inverse iteration does not.
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let v = dominant_eigenvector(&m, 1000, 1e-9).unwrap();
        assert_close(&v, &[0.5, 1.0 / 2.0_f64.sqrt(), 0.5]);
    }

    #[test]
    fn result_has_unit_length_and_positive_sum() {
        let m = DMatrix::from_row_slice(3, 3, &[0.0, 2.0, 0.5, 1.0, 0.0, 3.0, 0.2, 0.7, 0.0]);
        let v = dominant_eigenvector(&m, 1000, 1e-9).unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-9);
        assert!(v.iter().all(|&x| x > 0.0));
    }

    #[test]
    fn empty_matrix_gives_empty_vector() {
        let v = dominant_eigenvector(&DMatrix::zeros(0, 0), 10, 1e-9).unwrap();
        assert!(v.is_empty());
    }
}
