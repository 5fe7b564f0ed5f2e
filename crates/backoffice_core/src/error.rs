use miette::Diagnostic;
use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Configuration error")]
    #[diagnostic(
        code(backoffice_core::configuration_error),
        help("Check configuration file at {config_path}: expected {expected} ({field})")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error("Unknown entity: {name}")]
    #[diagnostic(
        code(backoffice_core::unknown_entity),
        help("Available entities: {}", available.join(", "))
    )]
    UnknownEntity {
        name: String,
        available: Vec<String>,
    },
}

/// Underlying cause of a configuration failure
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn unknown_entity(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::UnknownEntity {
            name: name.into(),
            available,
        }
    }
}
