use nalgebra::DMatrix;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("The document contains no predicted aligned error entry")]
    Empty,
    #[error("Row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Expected {expected} distances for a {size}x{size} matrix, found {found}")]
    SizeMismatch {
        size: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PaeDocument {
    List(Vec<PaeEntry>),
    Single(PaeEntry),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PaeEntry {
    /// AlphaFold DB v2 and later.
    Dense {
        predicted_aligned_error: Vec<Vec<f64>>,
    },
    /// AlphaFold DB v1: flattened row-major matrix with 1-based residue indices.
    Flattened {
        residue1: Vec<usize>,
        distance: Vec<f64>,
    },
}

/// Predicted aligned error between residue pairs, indexed from 0 for residue 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PaeMatrix(DMatrix<f64>);

impl PaeMatrix {
    pub fn new(matrix: DMatrix<f64>) -> Self {
        Self(matrix)
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.0
    }

    pub fn size(&self) -> usize {
        self.0.nrows()
    }

    pub fn read_from(reader: impl Read) -> Result<Self, PaeError> {
        let document: PaeDocument = serde_json::from_reader(reader)?;
        let entry = match document {
            PaeDocument::List(entries) => entries.into_iter().next().ok_or(PaeError::Empty)?,
            PaeDocument::Single(entry) => entry,
        };

        match entry {
            PaeEntry::Dense {
                predicted_aligned_error: rows,
            } => {
                let size = rows.len();
                if let Some((row, found)) = rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (i, r.len()))
                    .find(|&(_, len)| len != size)
                {
                    return Err(PaeError::RaggedRow {
                        row,
                        expected: size,
                        found,
                    });
                }
                Ok(Self(DMatrix::from_fn(size, size, |i, j| rows[i][j])))
            }
            PaeEntry::Flattened { residue1, distance } => {
                let size = residue1.iter().copied().max().ok_or(PaeError::Empty)?;
                let expected = size * size;
                if distance.len() != expected {
                    return Err(PaeError::SizeMismatch {
                        size,
                        expected,
                        found: distance.len(),
                    });
                }
                Ok(Self(DMatrix::from_row_slice(size, size, &distance)))
            }
        }
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, PaeError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_flattened_v1_layout_row_major() {
        let json = r#"[{"residue1": [1, 1, 2, 2], "residue2": [1, 2, 1, 2],
                        "distance": [0.0, 3.5, 7.25, 0.0]}]"#;
        let pae = PaeMatrix::read_from(json.as_bytes()).unwrap();
        assert_eq!(pae.size(), 2);
        assert_eq!(pae.matrix()[(0, 1)], 3.5);
        assert_eq!(pae.matrix()[(1, 0)], 7.25);
    }

    #[test]
    fn reads_dense_layout_in_list_and_bare_forms() {
        let list = r#"[{"predicted_aligned_error": [[0, 1, 2], [3, 0, 4], [5, 6, 0]],
                        "max_predicted_aligned_error": 31.75}]"#;
        let bare = r#"{"predicted_aligned_error": [[0, 1, 2], [3, 0, 4], [5, 6, 0]]}"#;

        let from_list = PaeMatrix::read_from(list.as_bytes()).unwrap();
        let from_bare = PaeMatrix::read_from(bare.as_bytes()).unwrap();
        assert_eq!(from_list, from_bare);
        assert_eq!(from_list.matrix()[(2, 1)], 6.0);
        assert_eq!(from_list.matrix()[(1, 2)], 4.0);
    }

    #[test]
    fn ragged_dense_matrix_is_rejected() {
        let json = r#"{"predicted_aligned_error": [[0, 1], [2]]}"#;
        assert!(matches!(
            PaeMatrix::read_from(json.as_bytes()),
            Err(PaeError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn flattened_size_mismatch_is_rejected() {
        let json = r#"[{"residue1": [1, 2, 3], "distance": [1.0, 2.0]}]"#;
        assert!(matches!(
            PaeMatrix::read_from(json.as_bytes()),
            Err(PaeError::SizeMismatch { size: 3, expected: 9, found: 2 })
        ));
    }

    #[test]
    fn empty_list_is_rejected() {
        assert!(matches!(
            PaeMatrix::read_from("[]".as_bytes()),
            Err(PaeError::Empty)
        ));
    }

    #[test]
    fn read_from_path_parses_file_on_disk() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"predicted_aligned_error": [[0.5]]}}"#).unwrap();
        let pae = PaeMatrix::read_from_path(file.path()).unwrap();
        assert_eq!(pae.size(), 1);
        assert_eq!(pae.matrix()[(0, 0)], 0.5);
    }
}
