use thiserror::Error;

use super::config::ConfigError;
use crate::core::geometry::GeometryError;
use crate::core::models::atom::ParseAtomLabelError;

/// Inputs an engine refuses to work on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{what}: expected {expected} entries, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Malformed atom label: {0}")]
    MalformedLabel(#[from] ParseAtomLabelError),

    #[error("No confidence value for residue {0}")]
    MissingConfidence(isize),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Geometry failure: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
