use data::{ConfigError, DataError, TransactionKind};
use openssl::error::ErrorStack;
use std::collections::BTreeSet;
use thiserror::Error;

/// Why authentication against the API failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("public key is not valid base64: {0}")]
    KeyDecode(#[source] ErrorStack),

    #[error("cannot import RSA public key: {0}")]
    KeyImport(#[source] ErrorStack),

    #[error("rsa encryption failed: {0}")]
    Encrypt(#[source] ErrorStack),

    #[error("encrypted token is not a valid header value")]
    InvalidToken,

    #[error("session rejected: {code} {description}")]
    SessionRejected { code: String, description: String },

    #[error("session request failed: {0}")]
    SessionRequest(#[source] TransportError),

    #[error("malformed session response: {0}")]
    SessionResponse(#[source] DataError),

    #[error("session response carries no session id")]
    MissingSessionId,
}

/// Wire level failure reported by an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),

    #[error("response body is not valid JSON: {0}")]
    Decode(String),

    #[error("http error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TransportError::Connect(_) | TransportError::Timeout | TransportError::Request(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else if err.is_request() || err.is_body() {
            TransportError::Request(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Coarse failure categories, stable across releases.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    KeyLoad,
    KeyFormat,
    Authentication,
    MissingFields,
    Connection,
    UnexpectedResponse,
    InvalidArgument,
    Config,
}

#[derive(Debug, Error)]
pub enum PesaError {
    #[error("cannot load key store: {0}")]
    KeyLoad(#[source] ConfigError),

    #[error("malformed key store: {0}")]
    KeyFormat(#[source] ConfigError),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("keys {} are missing in the {kind} query", fmt_fields(.missing))]
    MissingFields {
        kind: TransactionKind,
        missing: BTreeSet<&'static str>,
    },

    #[error("connection error: {0}")]
    Connection(#[source] TransportError),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(ConfigError),
}

impl PesaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PesaError::KeyLoad(_) => ErrorKind::KeyLoad,
            PesaError::KeyFormat(_) => ErrorKind::KeyFormat,
            PesaError::Authentication(_) => ErrorKind::Authentication,
            PesaError::MissingFields { .. } => ErrorKind::MissingFields,
            PesaError::Connection(_) => ErrorKind::Connection,
            PesaError::UnexpectedResponse(_) => ErrorKind::UnexpectedResponse,
            PesaError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            PesaError::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<ConfigError> for PesaError {
    fn from(err: ConfigError) -> Self {
        if err.is_key_load() {
            PesaError::KeyLoad(err)
        } else if err.is_key_format() {
            PesaError::KeyFormat(err)
        } else {
            PesaError::Config(err)
        }
    }
}

impl From<DataError> for PesaError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Config(cfg) => cfg.into(),
            DataError::Serde(err) => PesaError::UnexpectedResponse(err.to_string()),
            shape @ DataError::BadShape { .. } => PesaError::UnexpectedResponse(shape.to_string()),
        }
    }
}

impl From<TransportError> for PesaError {
    fn from(err: TransportError) -> Self {
        if err.is_network() {
            PesaError::Connection(err)
        } else {
            PesaError::UnexpectedResponse(err.to_string())
        }
    }
}

fn fmt_fields(fields: &BTreeSet<&'static str>) -> String {
    let names: Vec<&str> = fields.iter().copied().collect();
    format!("{{{}}}", names.join(", "))
}

pub type Error = PesaError;
pub type Result<T> = std::result::Result<T, PesaError>;
