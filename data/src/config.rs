use crate::Result;
use crate::environment::Environment;
use crate::error::ConfigError;
use derive_getters::Getters;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_KEYS_PATH: &str = "keys.json";
pub const DEFAULT_ORIGIN: &str = "*";
pub const PUBLIC_KEY_VAR: &str = "MPESA_PUBLIC_KEY";
pub const API_KEY_VAR: &str = "MPESA_API_KEY";

/// Key store contents: the vendor's RSA public key (base64) and the plaintext API key.
#[derive(Clone, Deserialize, Getters)]
pub struct Credentials {
    public_key: String,
    api_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self {
            public_key: public_key.into(),
            api_key: api_key.into(),
        }
        .validated()
    }

    /// Load from a JSON key store such as `keys.json`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::KeyStoreNotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        debug!(path = %path.display(), "loaded key store");
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let credentials: Credentials =
            serde_json::from_str(raw).map_err(ConfigError::KeyFormat)?;
        credentials.validated()
    }

    /// Load from `MPESA_PUBLIC_KEY` and `MPESA_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Credentials::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &'static str| {
            lookup(name).ok_or(ConfigError::MissingEnvVar { name })
        };
        let public_key = var(PUBLIC_KEY_VAR)?;
        let api_key = var(API_KEY_VAR)?;
        Self::new(public_key, api_key)
    }

    fn validated(self) -> Result<Self> {
        if self.public_key.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                field: "public_key",
            }
            .into());
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::EmptyField { field: "api_key" }.into());
        }
        Ok(self)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Client settings, usually read from a TOML file.
#[derive(Debug, Clone, Deserialize, Getters)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(deserialize_with = "environment_from_string")]
    #[getter(copy)]
    environment: Environment,
    keys_path: PathBuf,
    origin_address: String,
    #[getter(skip)]
    base_url: Option<Url>,
    #[getter(skip)]
    timeout_secs: Option<u64>,
    #[getter(skip)]
    timeout_ms: Option<u64>,
    #[getter(skip)]
    session_cache_ttl_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Sandbox,
            keys_path: PathBuf::from(DEFAULT_KEYS_PATH),
            origin_address: DEFAULT_ORIGIN.to_string(),
            base_url: None,
            timeout_secs: None,
            timeout_ms: None,
            session_cache_ttl_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(raw).map_err(ConfigError::from)?;
        Ok(config)
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_keys_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.keys_path = path.into();
        self
    }

    pub fn with_origin_address(mut self, origin: impl Into<String>) -> Self {
        self.origin_address = origin.into();
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sub-millisecond timeouts round up to 1ms; `Duration::ZERO` disables the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = match timeout.as_millis() {
            0 if !timeout.is_zero() => 1,
            millis => u64::try_from(millis).unwrap_or(u64::MAX),
        };
        self.timeout_secs = None;
        self.timeout_ms = Some(millis);
        self
    }

    pub fn with_session_cache_ttl(mut self, ttl: Duration) -> Self {
        self.session_cache_ttl_secs = Some(ttl.as_secs());
        self
    }

    /// Overrides the environment's base URL, e.g. for another market.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Request timeout; `timeout_ms` wins over `timeout_secs`, zero means none.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .map(Duration::from_millis)
            .or(self.timeout_secs.map(Duration::from_secs))
            .filter(|timeout| !timeout.is_zero())
    }

    /// `None` (or zero) means a fresh session id for every call.
    pub fn session_cache_ttl(&self) -> Option<Duration> {
        self.session_cache_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn environment_from_string<'de, D>(deserializer: D) -> std::result::Result<Environment, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(Environment::from_selector(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataError;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn key_store(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(contents.as_bytes())
            .expect("Failed to write key store");
        file
    }

    #[test]
    fn test_read_credentials_from_json() {
        let file = key_store(r#"{"public_key": "MIIBIjAN", "api_key": "secret"}"#);
        let credentials = Credentials::from_json_file(file.path()).expect("Failed to load keys");

        assert_eq!(credentials.public_key(), "MIIBIjAN");
        assert_eq!(credentials.api_key(), "secret");
    }

    #[test]
    fn test_missing_key_store() {
        let err = Credentials::from_json_file("./definitely/not/here/keys.json").unwrap_err();
        match err {
            DataError::Config(cfg) => {
                assert!(cfg.is_key_load());
                assert!(matches!(cfg, ConfigError::KeyStoreNotFound { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_are_format_errors() {
        for raw in [
            r#"{"api_key": "secret"}"#,
            r#"{"public_key": "MIIBIjAN"}"#,
            r#"{"public_key": 42, "api_key": "secret"}"#,
            "not json at all",
        ] {
            let file = key_store(raw);
            match Credentials::from_json_file(file.path()) {
                Err(DataError::Config(cfg)) => assert!(cfg.is_key_format(), "{raw}: {cfg}"),
                other => panic!("{raw}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn test_empty_fields_are_format_errors() {
        let err = Credentials::from_json_str(r#"{"public_key": "", "api_key": "secret"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            DataError::Config(ConfigError::EmptyField {
                field: "public_key"
            })
        ));
    }

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_credentials_from_env_vars() {
        let credentials = Credentials::from_lookup(lookup_in(&[
            (PUBLIC_KEY_VAR, "MIIBIjAN"),
            (API_KEY_VAR, "secret"),
        ]))
        .unwrap();
        assert_eq!(credentials.public_key(), "MIIBIjAN");
        assert_eq!(credentials.api_key(), "secret");
    }

    #[test]
    fn test_missing_env_vars_are_load_errors() {
        for (vars, expected) in [
            (vec![(API_KEY_VAR, "secret")], PUBLIC_KEY_VAR),
            (vec![(PUBLIC_KEY_VAR, "MIIBIjAN")], API_KEY_VAR),
            (vec![], PUBLIC_KEY_VAR),
        ] {
            match Credentials::from_lookup(lookup_in(&vars)) {
                Err(DataError::Config(cfg)) => {
                    assert!(cfg.is_key_load(), "{cfg}");
                    assert!(matches!(cfg, ConfigError::MissingEnvVar { name } if name == expected));
                }
                other => panic!("unexpected result {other:?}"),
            }
        }

        let empty = Credentials::from_lookup(lookup_in(&[
            (PUBLIC_KEY_VAR, "MIIBIjAN"),
            (API_KEY_VAR, ""),
        ]))
        .unwrap_err();
        assert!(matches!(empty, DataError::Config(cfg) if cfg.is_key_format()));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let credentials = Credentials::new("MIIBIjAN", "super-secret").unwrap();
        let printed = format!("{credentials:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.environment(), Environment::Sandbox);
        assert_eq!(config.keys_path(), &PathBuf::from("keys.json"));
        assert_eq!(config.origin_address(), "*");
        assert!(config.timeout().is_none());
        assert!(config.session_cache_ttl().is_none());
        assert!(config.base_url().is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            environment = "production"
            keys_path = "secrets/keys.json"
            origin_address = "10.0.0.1"
            timeout_secs = 15
            session_cache_ttl_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.keys_path(), &PathBuf::from("secrets/keys.json"));
        assert_eq!(config.origin_address(), "10.0.0.1");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert!(config.session_cache_ttl().is_none());
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let config = ClientConfig::default().with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));

        let config = ClientConfig::default().with_timeout(Duration::from_micros(10));
        assert_eq!(config.timeout(), Some(Duration::from_millis(1)));

        let config = ClientConfig::default().with_timeout(Duration::from_secs(15));
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = ClientConfig::from_toml_str("timeout_secs = 0").unwrap();
        assert!(config.timeout().is_none());

        let config = ClientConfig::from_toml_str("timeout_ms = 0").unwrap();
        assert!(config.timeout().is_none());

        let config = ClientConfig::default().with_timeout(Duration::ZERO);
        assert!(config.timeout().is_none());

        let config = ClientConfig::from_toml_str("timeout_ms = 250").unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_unknown_environment_is_sandbox() {
        let config = ClientConfig::from_toml_str(r#"environment = "testing""#).unwrap();
        assert_eq!(config.environment(), Environment::Sandbox);
    }
}
