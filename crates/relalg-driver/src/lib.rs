//! relalg-driver - execute compiled relations against a database
//!
//! Wraps a [`Driver`] with schema validation and transactions, and carries the
//! configuration and logging setup shared by applications using relalg.

pub mod config;
pub mod database;
pub mod driver;
pub mod error;
pub mod logging;
pub mod mock;

pub use config::{Config, ConfigError, DatabaseConfig, LoggingConfig};
pub use database::{Database, TableStatus, Transaction};
pub use driver::{Connector, Driver, JsonRow, QueryResult};
pub use error::{BoxError, DbError, Result};
pub use mock::MockDriver;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::{Database, Transaction};
    pub use crate::driver::{Driver, QueryResult};
    pub use crate::error::DbError;
    pub use relalg_sql::{DialectKind, Row};
}
