//! Database handle and transactions
//!
//! [`Database`] pairs a driver with a dialect. It validates a [`Schema`] against the live
//! database and opens [`Transaction`]s that compile relations and execute them.

use relalg_core::{Expr, Relation, Schema};
use relalg_sql::{Dialect, DialectKind, Row, SqlCompiler, Statement};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::driver::{Connector, Driver, JsonRow, QueryResult};
use crate::error::{DbError, Result};

/// What schema validation did with a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Created,
    Verified,
}

#[derive(Clone)]
pub struct Database {
    driver: Arc<dyn Driver>,
    dialect: &'static dyn Dialect,
}

impl Database {
    pub fn new(driver: Arc<dyn Driver>, dialect: DialectKind) -> Self {
        Self {
            driver,
            dialect: dialect.dialect(),
        }
    }

    /// Connect through `connector` using the configured descriptor and dialect.
    pub async fn open(config: &DatabaseConfig, connector: &dyn Connector) -> Result<Self> {
        tracing::info!(dialect = %config.dialect, "opening database");
        let driver = connector.connect(&config.url).await.map_err(DbError::Driver)?;
        Ok(Self::new(driver, config.dialect))
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    pub fn compiler(&self) -> SqlCompiler<'static> {
        SqlCompiler::new(self.dialect)
    }

    /// Execute a single statement outside any transaction.
    pub async fn execute(&self, statement: &Statement) -> Result<Vec<JsonRow>> {
        tracing::debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
        self.driver.execute(statement).await.map_err(DbError::Driver)
    }

    /// Create missing tables and check existing ones against their declarations.
    ///
    /// Tables are visited in declaration order. With `drop`, every table is dropped
    /// first and therefore recreated.
    pub async fn validate(&self, schema: &Schema, drop: bool) -> Result<Vec<(String, TableStatus)>> {
        let compiler = self.compiler();
        let mut report = Vec::with_capacity(schema.len());

        for relation in schema.tables() {
            let Some(name) = relation.name() else { continue };
            let create = compiler.relation_to_create(relation)?;

            if drop {
                self.execute(&compiler.relation_to_drop(relation)?).await?;
            }

            let live = self.execute(&self.dialect.definition_lookup(name)).await?;
            let status = match live.first() {
                None => {
                    self.execute(&create).await?;
                    tracing::info!(table = name, "created table");
                    TableStatus::Created
                }
                Some(definition) => {
                    if let Some(column) = self.dialect.definition_column() {
                        let found = definition
                            .get(column)
                            .and_then(|v| v.as_str())
                            .unwrap_or_default();

                        if found.to_lowercase() != create.sql.to_lowercase() {
                            tracing::warn!(
                                table = name,
                                expected = %create.sql,
                                found,
                                "schema drift"
                            );
                            return Err(DbError::SchemaDrift {
                                table: name.to_string(),
                                expected: create.sql,
                                found: found.to_string(),
                            });
                        }
                    }
                    tracing::info!(table = name, "verified table");
                    TableStatus::Verified
                }
            };

            report.push((name.to_string(), status));
        }

        Ok(report)
    }

    /// Start a transaction.
    pub async fn begin(&self) -> Result<Transaction> {
        let mut tx = Transaction {
            id: Uuid::new_v4(),
            driver: self.driver.clone(),
            dialect: self.dialect,
            finished: false,
        };
        if let Err(err) = tx.run(Statement::new("begin")).await {
            tx.finished = true;
            return Err(err);
        }
        tracing::info!(transaction = %tx.id, "transaction begin");
        Ok(tx)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect.name())
            .finish()
    }
}

/// A unit of work. Finish it with [`Transaction::commit`] or [`Transaction::rollback`].
pub struct Transaction {
    id: Uuid,
    driver: Arc<dyn Driver>,
    dialect: &'static dyn Dialect,
    finished: bool,
}

impl Transaction {
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn compiler(&self) -> SqlCompiler<'static> {
        SqlCompiler::new(self.dialect)
    }

    async fn run(&self, statement: Statement) -> Result<Vec<JsonRow>> {
        tracing::debug!(transaction = %self.id, sql = %statement.sql, "executing statement");
        self.driver
            .execute(&statement)
            .await
            .map_err(|source| DbError::Transaction {
                id: self.id,
                sql: statement.sql.clone(),
                source,
            })
    }

    /// Rows of `relation`, with computed and renamed columns under their keys.
    pub async fn query(&self, relation: &Relation) -> Result<QueryResult> {
        let statement = self.compiler().relation_to_select(relation, true);
        let rows = self.run(statement).await?;
        Ok(QueryResult::from_rows(rows))
    }

    /// Insert rows. Dialects with `returning *` hand back the stored rows.
    pub async fn insert(&self, relation: &Relation, rows: &[Row]) -> Result<Vec<JsonRow>> {
        let statement = self.compiler().rows_to_insert(relation, rows)?;
        self.run(statement).await
    }

    pub async fn update(&self, relation: &Relation, row: &Row, condition: Option<&Expr>) -> Result<Vec<JsonRow>> {
        let statement = self.compiler().row_to_update(relation, row, condition)?;
        self.run(statement).await
    }

    pub async fn remove(&self, relation: &Relation, condition: Option<&Expr>) -> Result<Vec<JsonRow>> {
        let statement = self.compiler().relation_to_remove(relation, condition)?;
        self.run(statement).await
    }

    pub async fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.run(Statement::new("commit")).await?;
        tracing::info!(transaction = %self.id, "transaction commit");
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.run(Statement::new("rollback")).await?;
        tracing::info!(transaction = %self.id, "transaction rollback");
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(transaction = %self.id, "transaction dropped without commit or rollback");
        }
    }
}
