use std::io;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// File that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A config file is larger than the loader accepts.
    #[error("config file {path} is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        /// Offending file.
        path: String,
        /// Its size in bytes.
        size: u64,
        /// The limit in bytes.
        limit: u64,
    },

    /// A config file, or the merged tree, is not valid TOML for [`Config`].
    ///
    /// [`Config`]: crate::Config
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// File (or `<merged config>`) that failed to parse.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("invalid value for '{field}': {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
