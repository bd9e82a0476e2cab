//! Structured logging setup
//!
//! Pretty console output for development, JSON for production, and daily rotated log
//! files when file output is requested.

use thiserror::Error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE: &str = "relalg.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    /// Unknown names fall back to pretty.
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File,
    Both,
}

impl LogOutput {
    /// Unknown names fall back to stdout.
    pub fn parse(value: &str) -> Self {
        match value {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let format = LogFormat::parse(&config.format);
    let output = LogOutput::parse(&config.output);

    let filter = EnvFilter::try_new(&config.level).map_err(|source| LoggingError::Filter {
        directive: config.level.clone(),
        source,
    })?;

    let console = match output {
        LogOutput::File => None,
        LogOutput::Stdout | LogOutput::Both => Some(match format {
            LogFormat::Pretty => fmt::layer().pretty().with_thread_ids(true).with_target(true).boxed(),
            LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
            LogFormat::Compact => fmt::layer().compact().boxed(),
        }),
    };

    let file = match output {
        LogOutput::Stdout => None,
        LogOutput::File | LogOutput::Both => {
            std::fs::create_dir_all(&config.directory)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, &config.directory, LOG_FILE);
            let layer = fmt::layer().with_writer(appender).with_ansi(false);
            Some(match format {
                LogFormat::Json => layer.json().boxed(),
                LogFormat::Pretty | LogFormat::Compact => layer.boxed(),
            })
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()?;

    tracing::info!(format = ?format, output = ?output, level = %config.level, "logging initialized");
    if file_enabled(output) {
        tracing::debug!(directory = %config.directory, file = LOG_FILE, "writing log files");
    }

    Ok(())
}

/// Like [`init`], reading `RUST_LOG`, `LOG_FORMAT`, `LOG_OUTPUT` and `LOG_DIR`.
pub fn init_from_env() -> Result<(), LoggingError> {
    let defaults = LoggingConfig::default();
    let config = LoggingConfig {
        level: std::env::var("RUST_LOG").unwrap_or(defaults.level),
        format: std::env::var("LOG_FORMAT").unwrap_or(defaults.format),
        output: std::env::var("LOG_OUTPUT").unwrap_or(defaults.output),
        directory: std::env::var("LOG_DIR").unwrap_or(defaults.directory),
    };
    init(&config)
}

fn file_enabled(output: LogOutput) -> bool {
    matches!(output, LogOutput::File | LogOutput::Both)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("fancy"), LogFormat::Pretty);
    }

    #[test]
    fn test_log_output_parse() {
        assert_eq!(LogOutput::parse("file"), LogOutput::File);
        assert_eq!(LogOutput::parse("both"), LogOutput::Both);
        assert_eq!(LogOutput::parse("stdout"), LogOutput::Stdout);
        assert_eq!(LogOutput::parse(""), LogOutput::Stdout);
        assert!(file_enabled(LogOutput::Both));
        assert!(!file_enabled(LogOutput::Stdout));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let config = LoggingConfig {
            level: "relalg=notalevel".to_string(),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::Filter { .. })));
    }

    #[test]
    fn test_init_from_env_reads_filter() {
        let previous = std::env::var("RUST_LOG").ok();
        std::env::set_var("RUST_LOG", "relalg=notalevel");

        let result = init_from_env();

        match previous {
            Some(level) => std::env::set_var("RUST_LOG", level),
            None => std::env::remove_var("RUST_LOG"),
        }
        assert!(matches!(result, Err(LoggingError::Filter { directive, .. }) if directive == "relalg=notalevel"));
    }
}
