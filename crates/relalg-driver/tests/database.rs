//! Schema validation and transactions against the scripted driver

use relalg_core::prelude::*;
use relalg_driver::mock::row;
use relalg_driver::{Database, DatabaseConfig, DbError, MockDriver, TableStatus};
use relalg_sql::{CompileError, DialectKind, Row};
use serde_json::json;
use std::sync::Arc;

fn schema() -> (Schema, Relation) {
    let mut schema = Schema::new();
    let users = schema
        .table(
            "users",
            [
                attribute("id", Type::Integer, Qualifiers::new().auto_increment()).unwrap(),
                attribute("name", Type::String, Qualifiers::new()).unwrap(),
            ],
            TableQualifiers::new(),
        )
        .unwrap();
    schema
        .table(
            "notes",
            [attribute("body", Type::String, Qualifiers::new().not_null()).unwrap()],
            TableQualifiers::new(),
        )
        .unwrap();
    (schema, users)
}

fn database(driver: &MockDriver, dialect: DialectKind) -> Database {
    Database::new(Arc::new(driver.clone()), dialect)
}

#[tokio::test]
async fn test_validate_creates_missing_tables() {
    let driver = MockDriver::new();
    let db = database(&driver, DialectKind::Sqlite);
    let (schema, _) = schema();

    let report = db.validate(&schema, false).await.unwrap();
    assert_eq!(
        report,
        vec![
            ("users".to_string(), TableStatus::Created),
            ("notes".to_string(), TableStatus::Created),
        ]
    );

    assert_eq!(
        driver.sql_log().await,
        vec![
            "select sql from sqlite_master where type='table' and name=?",
            "create table users (id integer primary key autoincrement, name text)",
            "select sql from sqlite_master where type='table' and name=?",
            "create table notes (body text not null)",
        ]
    );

    let executed = driver.executed().await;
    assert_eq!(executed[0].params, vec![Value::from("users")]);
    assert_eq!(executed[2].params, vec![Value::from("notes")]);
}

#[tokio::test]
async fn test_validate_compares_definitions_ignoring_case() {
    let driver = MockDriver::new();
    driver
        .returning(
            "select sql from sqlite_master",
            vec![row([(
                "sql",
                json!("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)"),
            )])],
        )
        .await;

    let db = database(&driver, DialectKind::Sqlite);
    let (schema, _) = schema();

    let report = db.validate(&schema, false).await.unwrap();
    assert_eq!(report[0], ("users".to_string(), TableStatus::Verified));
    assert_eq!(report[1], ("notes".to_string(), TableStatus::Created));
}

#[tokio::test]
async fn test_validate_reports_drift() {
    let driver = MockDriver::new();
    driver
        .returning(
            "select sql from sqlite_master",
            vec![row([("sql", json!("create table users (id integer)"))])],
        )
        .await;

    let db = database(&driver, DialectKind::Sqlite);
    let (schema, _) = schema();

    match db.validate(&schema, false).await {
        Err(DbError::SchemaDrift { table, found, .. }) => {
            assert_eq!(table, "users");
            assert_eq!(found, "create table users (id integer)");
        }
        other => panic!("expected schema drift, got {:?}", other),
    }
    assert!(!driver.sql_log().await.iter().any(|sql| sql.starts_with("create")));
}

#[tokio::test]
async fn test_validate_drops_first() {
    let driver = MockDriver::new();
    let db = database(&driver, DialectKind::Postgres);
    let (schema, _) = schema();

    db.validate(&schema, true).await.unwrap();

    let log = driver.sql_log().await;
    assert_eq!(log[0], "drop table if exists users");
    assert_eq!(
        log[1],
        "select column_name from information_schema.columns where table_name=$1"
    );
    assert_eq!(log[2], "create table users (id serial, name text)");
}

#[tokio::test]
async fn test_postgres_checks_existence_only() {
    let driver = MockDriver::new();
    driver
        .returning(
            "select column_name",
            vec![row([("column_name", json!("something_else"))])],
        )
        .await;

    let db = database(&driver, DialectKind::Postgres);
    let (schema, _) = schema();

    let report = db.validate(&schema, false).await.unwrap();
    assert_eq!(report[0].1, TableStatus::Verified);
}

#[tokio::test]
async fn test_transaction_lifecycle() {
    let driver = MockDriver::new();
    driver
        .returning(
            "select id, name from users",
            vec![row([("id", json!(1)), ("name", json!("Anna"))])],
        )
        .await;

    let db = database(&driver, DialectKind::Sqlite);
    let (_, users) = schema();

    let tx = db.begin().await.unwrap();
    tx.insert(&users, &[Row::new().set("name", "Anna")]).await.unwrap();
    let result = tx.query(&users).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(result.row_count, 1);
    assert_eq!(result.columns, vec!["id", "name"]);
    assert_eq!(result.rows[0]["name"], json!("Anna"));

    assert_eq!(
        driver.sql_log().await,
        vec![
            "begin",
            "insert into users (name) values ('Anna')",
            "select id, name from users",
            "commit",
        ]
    );
}

#[tokio::test]
async fn test_update_remove_rollback() {
    let driver = MockDriver::new();
    let db = database(&driver, DialectKind::Postgres);
    let (_, users) = schema();
    let cond = users.attr("id").unwrap().eq(3).unwrap();

    let tx = db.begin().await.unwrap();
    tx.update(&users, &Row::new().set("name", "Bo"), Some(&cond)).await.unwrap();
    tx.remove(&users, Some(&cond)).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(
        driver.sql_log().await,
        vec![
            "begin",
            "update users set name = 'Bo' where (id = 3)",
            "delete from users where (id = 3)",
            "rollback",
        ]
    );
}

#[tokio::test]
async fn test_driver_error_carries_transaction_context() {
    let driver = MockDriver::new();
    driver.failing("delete", "database is locked").await;

    let db = database(&driver, DialectKind::Sqlite);
    let (_, users) = schema();

    let tx = db.begin().await.unwrap();
    let id = tx.id();
    match tx.remove(&users, None).await {
        Err(DbError::Transaction { id: failed, sql, source }) => {
            assert_eq!(failed, id);
            assert_eq!(sql, "delete from users");
            assert_eq!(source.to_string(), "database is locked");
        }
        other => panic!("expected transaction error, got {:?}", other),
    }
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_compile_errors_execute_nothing() {
    let driver = MockDriver::new();
    let db = database(&driver, DialectKind::Sqlite);
    let (_, users) = schema();
    let derived = users.project([("id", users.attr("id").unwrap())]).unwrap();

    let tx = db.begin().await.unwrap();
    let err = tx.insert(&derived, &[Row::new().set("id", 1)]).await.unwrap_err();
    assert!(matches!(err, DbError::Compile(CompileError::NotWritable { op: "insert" })));

    let many = [Row::new().set("name", "a"), Row::new().set("name", "b")];
    let err = tx.insert(&users, &many).await.unwrap_err();
    assert!(matches!(err, DbError::Compile(CompileError::MultiRowUnsupported { .. })));
    tx.commit().await.unwrap();

    assert_eq!(driver.sql_log().await, vec!["begin", "commit"]);
}

#[tokio::test]
async fn test_open_uses_connector() {
    let connector = MockDriver::new();
    let config = DatabaseConfig {
        dialect: DialectKind::Postgres,
        url: "postgres://localhost/relalg".to_string(),
        drop_existing: false,
    };

    let db = Database::open(&config, &connector).await.unwrap();
    assert_eq!(db.dialect().name(), "postgres");
    assert_eq!(connector.connections().await, vec!["postgres://localhost/relalg"]);
}
