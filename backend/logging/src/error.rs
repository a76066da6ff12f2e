use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the logging facade.
///
/// Logging calls themselves never return errors; only flushing, building a
/// logger from configuration and installing the tracing bridge do.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to flush log sink: {0}")]
    Sync(#[source] std::io::Error),

    #[error("unrecognized log level: {0:?}")]
    InvalidLevel(String),

    #[error("failed to open log output {path}: {source}")]
    OpenSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid logger configuration: {0}")]
    Config(String),

    #[error("failed to install tracing subscriber: {0}")]
    TracingInit(String),
}
