//! Loading configuration files with environment overrides

use relalg_driver::{Config, ConfigError};
use relalg_sql::DialectKind;
use std::io::Write;

const CONFIG_YAML: &str = r#"
database:
  dialect: sqlite
  url: "file:app.db"
  drop_existing: false
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// Environment variables are process-wide, so every override case lives in one test.
#[test]
fn test_load_with_env_overrides() {
    let file = write_config(CONFIG_YAML);

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.database.dialect, DialectKind::Sqlite);
    assert_eq!(config.database.url, "file:app.db");
    assert!(!config.database.drop_existing);

    std::env::set_var("RELALG_DIALECT", "postgres");
    std::env::set_var("RELALG_DATABASE_URL", "postgres://db/app");
    std::env::set_var("RELALG_DROP_EXISTING", "true");
    std::env::set_var("LOG_FORMAT", "json");

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.database.dialect, DialectKind::Postgres);
    assert_eq!(config.database.url, "postgres://db/app");
    assert!(config.database.drop_existing);
    assert_eq!(config.logging.format, "json");

    std::env::set_var("RELALG_DIALECT", "oracle");
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::InvalidEnvVar { var: "RELALG_DIALECT", .. })
    ));
    std::env::remove_var("RELALG_DIALECT");

    std::env::set_var("RELALG_DROP_EXISTING", "sometimes");
    assert!(matches!(
        Config::load(file.path()),
        Err(ConfigError::InvalidEnvVar { var: "RELALG_DROP_EXISTING", .. })
    ));

    std::env::remove_var("RELALG_DATABASE_URL");
    std::env::remove_var("RELALG_DROP_EXISTING");
    std::env::remove_var("LOG_FORMAT");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_invalid_yaml() {
    let file = write_config("database: [not, a, mapping");
    assert!(matches!(Config::load(file.path()), Err(ConfigError::Yaml(_))));
}

#[test]
fn test_round_trip_through_yaml() {
    let mut config = Config::default();
    config.database.url = "file:test.db".to_string();

    let yaml = serde_yaml::to_string(&config).unwrap();
    let file = write_config(&yaml);

    let loaded: Config = serde_yaml::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(loaded.database.url, "file:test.db");
    assert_eq!(loaded.logging.level, config.logging.level);
}
