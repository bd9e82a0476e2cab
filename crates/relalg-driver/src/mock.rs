//! In-memory driver for tests
//!
//! Records every executed statement and answers from a script. A scripted response is
//! matched by SQL prefix and consumed on first use; unmatched statements return no rows.

use async_trait::async_trait;
use relalg_sql::Statement;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::driver::{Connector, Driver, JsonRow};
use crate::error::BoxError;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct MockError(pub String);

#[derive(Debug)]
enum Outcome {
    Rows(Vec<JsonRow>),
    Fail(String),
}

#[derive(Debug, Default)]
struct MockState {
    executed: Vec<Statement>,
    script: VecDeque<(String, Outcome)>,
    connected: Vec<String>,
}

/// Scripted driver. Clones share the same log and script.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next statement starting with `prefix` with `rows`.
    pub async fn returning(&self, prefix: impl Into<String>, rows: Vec<JsonRow>) -> &Self {
        self.state
            .lock()
            .await
            .script
            .push_back((prefix.into(), Outcome::Rows(rows)));
        self
    }

    /// Fail the next statement starting with `prefix`.
    pub async fn failing(&self, prefix: impl Into<String>, message: impl Into<String>) -> &Self {
        self.state
            .lock()
            .await
            .script
            .push_back((prefix.into(), Outcome::Fail(message.into())));
        self
    }

    pub async fn executed(&self) -> Vec<Statement> {
        self.state.lock().await.executed.clone()
    }

    /// SQL text of every executed statement, in order.
    pub async fn sql_log(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .executed
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    /// Descriptors passed to [`Connector::connect`].
    pub async fn connections(&self) -> Vec<String> {
        self.state.lock().await.connected.clone()
    }
}

/// Build a result row from column/value pairs.
pub fn row<I, K>(values: I) -> JsonRow
where
    I: IntoIterator<Item = (K, serde_json::Value)>,
    K: Into<String>,
{
    values.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[async_trait]
impl Driver for MockDriver {
    async fn execute(&self, statement: &Statement) -> Result<Vec<JsonRow>, BoxError> {
        let mut state = self.state.lock().await;
        state.executed.push(statement.clone());

        let position = state
            .script
            .iter()
            .position(|(prefix, _)| statement.sql.starts_with(prefix.as_str()));

        match position.and_then(|i| state.script.remove(i)) {
            Some((_, Outcome::Rows(rows))) => Ok(rows),
            Some((_, Outcome::Fail(message))) => Err(Box::new(MockError(message))),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Connector for MockDriver {
    async fn connect(&self, url: &str) -> Result<Arc<dyn Driver>, BoxError> {
        self.state.lock().await.connected.push(url.to_string());
        Ok(Arc::new(self.clone()))
    }
}
