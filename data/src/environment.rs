use crate::error::ConfigError;
use crate::transaction::TransactionKind;
use derive_more::Display;
use enum_map::EnumMap;
use std::convert::Infallible;
use std::str::FromStr;
use url::Url;

pub const API_HOST: &str = "openapi.m-pesa.com";
pub const SANDBOX_BASE_URL: &str = "https://openapi.m-pesa.com/sandbox/ipg/v2/vodacomTZN/";
pub const PRODUCTION_BASE_URL: &str = "https://openapi.m-pesa.com/openapi/ipg/v2/vodacomTZN/";

const SESSION_PATH: &str = "getSession/";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Display)]
pub enum Environment {
    #[default]
    #[display("sandbox")]
    Sandbox,
    #[display("production")]
    Production,
}

impl Environment {
    /// `"production"` selects production, every other selector falls back to sandbox.
    pub fn from_selector(selector: &str) -> Self {
        match selector {
            "production" => Environment::Production,
            _ => Environment::Sandbox,
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_selector(s))
    }
}

/// Resolved URL table for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    session: Url,
    transactions: EnumMap<TransactionKind, Url>,
}

impl Endpoints {
    pub fn for_environment(environment: Environment) -> Result<Self, ConfigError> {
        Self::from_base(Url::parse(environment.base_url())?)
    }

    pub fn from_base(mut base: Url) -> Result<Self, ConfigError> {
        // Url::join replaces the last segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let joined = EnumMap::from_fn(|kind: TransactionKind| base.join(kind.path()));
        let mut transactions = EnumMap::from_fn(|_| base.clone());
        for (kind, url) in joined {
            transactions[kind] = url?;
        }

        Ok(Self {
            session: base.join(SESSION_PATH)?,
            transactions,
        })
    }

    pub fn session(&self) -> &Url {
        &self.session
    }

    pub fn transaction(&self, kind: TransactionKind) -> &Url {
        &self.transactions[kind]
    }
}
