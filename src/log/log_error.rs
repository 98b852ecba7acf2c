use std::{io, path::PathBuf};

use thiserror::Error;

/// Failure reported by a single sink while receiving a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("sink queue is full, record dropped")]
    QueueFull,
    #[error("sink worker is gone")]
    Disconnected,
    #[error("sink panicked: {0}")]
    Panicked(String),
    #[error("sink rejected record: {0}")]
    Rejected(String),
}

/// Errors raised while reading or interpreting a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid value {value:?} for key `{key}`")]
    InvalidValue { key: String, value: String },
}

/// Top-level error for building a logger from configuration.
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("log file setup failed: {0}")]
    Io(#[from] io::Error),
}
