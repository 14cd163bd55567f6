use super::error::WorkflowError;
use crate::core::io::pae::PaeMatrix;
use crate::core::models::structure::Structure;
use crate::engine::config::DomainConfig;
use crate::engine::error::ValidationError;
use crate::engine::tasks;
use tracing::instrument;

/// Splits `structure` into domains using its PAE matrix.
///
/// Residue `i` of the matrix is the residue numbered `i` in the structure and
/// its confidence is the B-factor of its CA atom (pLDDT for predicted models).
/// The returned domains hold residue numbers.
#[instrument(skip_all, name = "domain_workflow")]
pub fn run(
    structure: &Structure,
    pae: &PaeMatrix,
    config: &DomainConfig,
) -> Result<Vec<Vec<usize>>, WorkflowError> {
    if structure.residue_count() == 0 {
        return Err(WorkflowError::EmptyStructure);
    }

    let confidences = structure.residue_confidences();
    let size = pae.size();
    if confidences.len() != size {
        return Err(ValidationError::LengthMismatch {
            what: "residue confidences",
            expected: size,
            found: confidences.len(),
        }
        .into());
    }
    let confidence = (1..=size as isize)
        .map(|number| {
            confidences
                .get(&number)
                .copied()
                .ok_or(ValidationError::MissingConfidence(number))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tasks::domains::run(pae.matrix(), &confidence, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::residue::ResidueKey;
    use nalgebra::{DMatrix, Point3};

    fn structure_with(numbers: &[isize], b_factor: f64) -> Structure {
        let mut structure = Structure::new();
        let chain = structure.add_chain('A');
        for &n in numbers {
            let residue = structure
                .add_residue(chain, ResidueKey::new(n), "ALA")
                .unwrap();
            let mut atom = Atom::new("CA", residue, Point3::new(n as f64 * 3.8, 0.0, 0.0));
            atom.b_factor = b_factor;
            structure.add_atom_to_residue(residue, atom).unwrap();
        }
        structure
    }

    fn block_pae(n: usize, first: usize) -> PaeMatrix {
        PaeMatrix::new(DMatrix::from_fn(n, n, |i, j| {
            if (i < first) == (j < first) { 1.0 } else { 25.0 }
        }))
    }

    #[test]
    fn domains_come_back_as_residue_numbers() {
        let numbers: Vec<isize> = (1..=64).collect();
        let structure = structure_with(&numbers, 92.0);

        let domains = run(&structure, &block_pae(64, 32), &DomainConfig::default()).unwrap();

        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0], (1..=32).collect::<Vec<_>>());
        assert_eq!(domains[1], (33..=64).collect::<Vec<_>>());
    }

    #[test]
    fn matrix_size_must_match_residue_count() {
        let structure = structure_with(&[1, 2, 3], 92.0);
        let err = run(&structure, &block_pae(4, 2), &DomainConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation(ValidationError::LengthMismatch {
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn numbering_gaps_are_reported() {
        let structure = structure_with(&[1, 2, 4], 92.0);
        let err = run(&structure, &block_pae(3, 1), &DomainConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation(ValidationError::MissingConfidence(3))
        ));
    }

    #[test]
    fn empty_structure_is_rejected() {
        let err = run(&Structure::new(), &block_pae(1, 1), &DomainConfig::default()).unwrap_err();
        assert!(matches!(err, WorkflowError::EmptyStructure));
    }
}
