//! Dialect policies
//!
//! A dialect decides only what differs between SQL targets: column affinities, how
//! auto-increment keys are declared, placeholders, insert conventions and how the live
//! definition of a table is looked up. Everything else is rendered by the shared
//! compiler core.

use relalg_core::{Attribute, Type, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::statement::Statement;

pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Storage affinity of a type. Domains use their base type's affinity.
    fn affinity(&self, ty: &Type) -> &'static str {
        match ty {
            Type::Integer => "integer",
            Type::Number => "numeric",
            Type::String => "text",
            Type::Boolean => "integer",
            Type::Enum(_) => "text",
            Type::Domain(domain) => self.affinity(domain.base()),
        }
    }

    /// Column type written in CREATE TABLE.
    fn column_type(&self, attribute: &Attribute) -> &'static str {
        self.affinity(attribute.ty())
    }

    /// Key constraint following the column type, if any.
    fn key_constraint(&self, attribute: &Attribute) -> Option<&'static str> {
        attribute.qualifiers().primary_key.then_some("primary key")
    }

    /// Boolean literal text. Booleans are stored with integer affinity.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    /// Placeholder for the `index`th parameter, counting from 1.
    fn placeholder(&self, index: usize) -> String;

    fn supports_multi_row_insert(&self) -> bool {
        false
    }

    /// Text appended to every INSERT.
    fn insert_suffix(&self) -> &'static str {
        ""
    }

    /// Statement returning the live definition of `table`; no rows means it is absent.
    fn definition_lookup(&self, table: &str) -> Statement;

    /// Column of the lookup result holding the stored CREATE text. Dialects that do not
    /// keep the text only check for existence.
    fn definition_column(&self) -> Option<&'static str> {
        None
    }
}

/// SQLite: inline `primary key autoincrement`, `?` placeholders, definitions kept in
/// `sqlite_master`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn key_constraint(&self, attribute: &Attribute) -> Option<&'static str> {
        let qualifiers = attribute.qualifiers();
        if qualifiers.auto_increment {
            Some("primary key autoincrement")
        } else if qualifiers.primary_key {
            Some("primary key")
        } else {
            None
        }
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn definition_lookup(&self, table: &str) -> Statement {
        Statement::with_params(
            format!(
                "select sql from sqlite_master where type='table' and name={}",
                self.placeholder(1)
            ),
            vec![Value::from(table)],
        )
    }

    fn definition_column(&self) -> Option<&'static str> {
        Some("sql")
    }
}

/// PostgreSQL: `serial` columns, `$n` placeholders, multi-row inserts returning the
/// stored rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn column_type(&self, attribute: &Attribute) -> &'static str {
        let affinity = self.affinity(attribute.ty());
        if attribute.qualifiers().auto_increment && affinity == "integer" {
            "serial"
        } else {
            affinity
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn supports_multi_row_insert(&self) -> bool {
        true
    }

    fn insert_suffix(&self) -> &'static str {
        " returning *"
    }

    fn definition_lookup(&self, table: &str) -> Statement {
        Statement::with_params(
            format!(
                "select column_name from information_schema.columns where table_name={}",
                self.placeholder(1)
            ),
            vec![Value::from(table)],
        )
    }
}

/// Dialect selector used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Sqlite,
    Postgres,
}

impl DialectKind {
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            DialectKind::Sqlite => &Sqlite,
            DialectKind::Postgres => &Postgres,
        }
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DialectKind::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect().name())
    }
}
