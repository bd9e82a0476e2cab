//! relalg-sql - render relations to SQL
//!
//! [`SqlCompiler`] turns relations and expressions from `relalg-core` into SELECT,
//! CREATE, INSERT, UPDATE and DELETE statements for a chosen [`Dialect`].

pub mod compiler;
pub mod dialect;
pub mod error;
pub mod row;
pub mod statement;

pub use compiler::SqlCompiler;
pub use dialect::{Dialect, DialectKind, Postgres, Sqlite};
pub use error::CompileError;
pub use row::Row;
pub use statement::Statement;
