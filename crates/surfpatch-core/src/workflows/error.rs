use crate::engine::error::{EngineError, ValidationError};
use crate::engine::state::UnitId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Structure contains no residues")]
    EmptyStructure,

    #[error("Chain '{0}' not found in structure")]
    UnknownChain(char),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unit {unit} failed: {source}")]
    Unit {
        unit: UnitId,
        #[source]
        source: EngineError,
    },
}
