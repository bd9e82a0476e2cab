//! Construction-time errors for types, expressions and relations

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Invalid enumeration label '{0}'")]
    InvalidEnumLabel(String),

    #[error("Invalid base type '{0}': domains must be based on a primitive or enum type")]
    InvalidBaseType(String),

    #[error("Unknown enumeration label '{label}' in domain '{domain}'")]
    UnknownEnumLabel { domain: String, label: String },

    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("Attribute '{0}' cannot be auto_increment: only integers can be auto_increment")]
    AutoIncrementNotInteger(String),

    #[error("Invalid expression '{op}': arguments '{left}' and '{right}' are not compatible")]
    IncompatibleTypes {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("{context} is not a boolean expression (found '{found}')")]
    NotBoolean {
        context: &'static str,
        found: String,
    },

    #[error("Aggregate '{func}' requires a numeric operand (found '{found}')")]
    NotNumeric {
        func: &'static str,
        found: String,
    },

    #[error("{context} references an attribute outside the relation")]
    OutOfScope { context: &'static str },

    #[error("Projection '{0}' is neither aggregated nor functionally dependent on the grouping")]
    NotAggregated(String),

    #[error("Membership requires a relation with exactly one attribute (found {0})")]
    NotSingleAttribute(usize),

    #[error("{0} requires at least one attribute")]
    NoAttributes(&'static str),

    #[error("Duplicate attribute '{0}' in relation")]
    DuplicateAttribute(String),

    #[error("Relation '{0}' is already declared")]
    DuplicateRelation(String),

    #[error("Relation has no attribute '{0}'")]
    UnknownAttribute(String),
}

pub type Result<T> = std::result::Result<T, Error>;
