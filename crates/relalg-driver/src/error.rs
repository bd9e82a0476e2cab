//! Errors raised at the database boundary

use relalg_sql::CompileError;
use thiserror::Error;
use uuid::Uuid;

/// Error type drivers report. It is carried through unchanged.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Driver error: {0}")]
    Driver(#[source] BoxError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Schema drift on table '{table}': expected '{expected}', found '{found}'")]
    SchemaDrift {
        table: String,
        expected: String,
        found: String,
    },

    #[error("Transaction {id} failed on '{sql}': {source}")]
    Transaction {
        id: Uuid,
        sql: String,
        #[source]
        source: BoxError,
    },
}

impl From<relalg_core::Error> for DbError {
    fn from(err: relalg_core::Error) -> Self {
        DbError::Compile(CompileError::Algebra(err))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
