//! Driver abstraction
//!
//! A driver executes one compiled statement at a time and returns rows as JSON maps.
//! Connection handling, pooling and wire protocols stay behind this trait.

use async_trait::async_trait;
use relalg_sql::Statement;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::BoxError;

/// One result row, column name to value.
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait Driver: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Vec<JsonRow>, BoxError>;
}

/// Opens drivers from an opaque connection descriptor.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Arc<dyn Driver>, BoxError>;
}

/// Rows returned by a query, with column order taken from the first row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<JsonRow>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<JsonRow>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            columns,
            row_count: rows.len(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "columns": self.columns,
            "rows": self.rows,
            "row_count": self.row_count
        })
    }
}
