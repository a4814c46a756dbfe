use std::path::PathBuf;

use thiserror::Error;

/// Catalog persistence failures. The only error class that aborts a run.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog unreadable at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog at {path} is not a valid venue list: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog write to {path} failed: {message}")]
    Write { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingEnv(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read rules file {path}: {source}")]
    RulesUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rules: {0}")]
    RulesInvalid(#[from] toml::de::Error),

    #[error("Invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },
}
