//! Errors raised while rendering relations to SQL

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Algebra(#[from] relalg_core::Error),

    #[error("Relation is not creatable: only base tables can be created")]
    NotCreatable,

    #[error("Relation is not writable: {op} requires a base table")]
    NotWritable { op: &'static str },

    #[error("Invalid attribute '{column}' for relation '{relation}'")]
    UnknownColumn { relation: String, column: String },

    #[error("{op} requires at least one row and one column")]
    EmptyRow { op: &'static str },

    #[error("Row {row} does not supply the same columns as the first row")]
    HeterogeneousRows { row: usize },

    #[error("The {dialect} dialect does not support multi-row inserts")]
    MultiRowUnsupported { dialect: &'static str },
}
