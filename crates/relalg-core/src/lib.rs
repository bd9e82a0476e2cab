//! relalg - typed relational algebra for building SQL
//!
//! Host code declares domains and attributes, builds base relations, and composes them
//! through project, restrict, join, group and order. Every step is type- and
//! scope-checked when it is built; the `relalg-sql` crate renders the result.

pub mod error;
pub mod expr;
pub mod ident;
pub mod relation;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
pub use expr::{attribute, wrap_literal, Attribute, Expr, Operand};
pub use relation::{table, valid, valid_aggregate, Relation, RelationKind, TableQualifiers};
pub use schema::Schema;
pub use types::{domain, join, Domain, EnumType, EnumValue, Qualifiers, Type, TypeKind, Value};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::expr::{attribute, Attribute, Expr, Operand};
    pub use crate::relation::{table, Relation, TableQualifiers};
    pub use crate::schema::Schema;
    pub use crate::types::{domain, Qualifiers, Type, Value};
}
