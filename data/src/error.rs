use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("expected {expected}, got {got}")]
    BadShape {
        expected: &'static str,
        got: &'static str,
    },
}

/// All errors related to key store and config loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("key store '{}' not found", path.display())]
    KeyStoreNotFound { path: PathBuf },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("environment variable '{name}' is not set")]
    MissingEnvVar { name: &'static str },

    #[error("malformed key store: {0}")]
    KeyFormat(#[source] serde_json::Error),

    #[error("malformed key store: field '{field}' is empty")]
    EmptyField { field: &'static str },

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ConfigError {
    /// True when the key store could not be located or read at all,
    /// as opposed to being present but malformed.
    pub fn is_key_load(&self) -> bool {
        matches!(
            self,
            ConfigError::KeyStoreNotFound { .. }
                | ConfigError::Io { .. }
                | ConfigError::MissingEnvVar { .. }
        )
    }

    pub fn is_key_format(&self) -> bool {
        matches!(
            self,
            ConfigError::KeyFormat(_) | ConfigError::EmptyField { .. }
        )
    }
}

pub type Error = DataError;
pub type Result<T> = std::result::Result<T, DataError>;
