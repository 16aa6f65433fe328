use crate::crypto::{EncryptedKey, KeyEncryptor};
use crate::error::{AuthError, PesaError, Result};
use crate::headers::{Origin, build_headers};
use crate::session::{NoSessionCache, SessionCache, TtlSessionCache};
use crate::transport::{HttpTransport, ReqwestTransport};
use data::config::DEFAULT_KEYS_PATH;
use data::{
    ClientConfig, Credentials, Endpoints, Environment, SessionResponse, TransactionKind,
    TransactionQuery,
};
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};
use url::Url;

/// Selector used when the caller does not name an environment; resolves to sandbox.
pub const DEFAULT_ENVIRONMENT: &str = "testing";

/// Authenticated M-Pesa client.
///
/// Construction loads the credentials and encrypts the API key once, so a
/// `Client` that exists is always able to authenticate. Every transaction call
/// asks for a session id (unless a [`SessionCache`] supplies one), encrypts it
/// and posts the query as JSON.
#[derive(Debug)]
pub struct Client<T = ReqwestTransport> {
    environment: Environment,
    endpoints: Endpoints,
    encryptor: KeyEncryptor,
    encrypted_api_key: EncryptedKey,
    origin: Origin,
    transport: T,
    session_cache: Box<dyn SessionCache>,
}

impl Client<ReqwestTransport> {
    /// Load keys from `key_path` and target the environment named by `environment`.
    pub fn new(key_path: impl AsRef<Path>, environment: &str) -> Result<Self> {
        let credentials = Credentials::from_json_file(key_path)?;
        let transport = ReqwestTransport::with_timeout(None)?;
        ClientBuilder::new(credentials, transport)
            .environment(Environment::from_selector(environment))
            .build()
    }

    /// `keys.json` in the working directory, sandbox environment.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_KEYS_PATH, DEFAULT_ENVIRONMENT)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let credentials = Credentials::from_json_file(config.keys_path())?;
        Self::from_config_with_credentials(config, credentials)
    }

    /// Like [`Client::from_config`] but with keys from another source, e.g.
    /// [`Credentials::from_env`]; `keys_path` is ignored.
    pub fn from_config_with_credentials(
        config: &ClientConfig,
        credentials: Credentials,
    ) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.timeout())?;

        let mut builder = ClientBuilder::new(credentials, transport)
            .environment(config.environment())
            .origin_address(config.origin_address().as_str());
        if let Some(base_url) = config.base_url() {
            builder = builder.base_url(base_url.clone());
        }
        if let Some(ttl) = config.session_cache_ttl() {
            builder = builder.session_cache(TtlSessionCache::new(ttl));
        }
        builder.build()
    }
}

impl<T: HttpTransport> Client<T> {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn origin_address(&self) -> &str {
        self.origin.as_str()
    }

    /// Change the `Origin` sent with subsequent requests.
    pub fn set_origin_address(&mut self, address: &str) -> Result<()> {
        self.origin = Origin::parse(address)?;
        Ok(())
    }

    /// The API key encrypted at construction; authorizes every `getSession/` request.
    pub fn encrypted_api_key(&self) -> &EncryptedKey {
        &self.encrypted_api_key
    }

    /// Session id for the next call: cached if the strategy has one, otherwise fetched.
    pub async fn session_id(&self) -> Result<String> {
        if let Some(session_id) = self.session_cache.get() {
            debug!("reusing cached session id");
            return Ok(session_id);
        }

        match self.fetch_session_id().await {
            Ok(session_id) => {
                self.session_cache.store(&session_id);
                Ok(session_id)
            }
            Err(err) => {
                self.session_cache.invalidate();
                warn!(error = %err, "session creation failed");
                Err(err.into())
            }
        }
    }

    async fn fetch_session_id(&self) -> std::result::Result<String, AuthError> {
        let headers = build_headers(&self.encrypted_api_key, &self.origin)?;

        let body = self
            .transport
            .get_json(self.endpoints.session(), headers)
            .await
            .map_err(AuthError::SessionRequest)?;
        let session = SessionResponse::from_value(body).map_err(AuthError::SessionResponse)?;
        debug!(
            code = %session.response_code(),
            description = %session.response_desc(),
            "session response"
        );

        if session.is_rejected() {
            return Err(AuthError::SessionRejected {
                code: session.response_code().clone(),
                description: session.response_desc().clone(),
            });
        }
        session.session_id().clone().ok_or(AuthError::MissingSessionId)
    }

    /// Request headers authorized with `auth_key`, or with a freshly encrypted
    /// session id when no key is given.
    pub async fn default_headers(&self, auth_key: Option<&EncryptedKey>) -> Result<HeaderMap> {
        let auth_key = match auth_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => {
                let session_id = self.session_id().await?;
                self.encryptor.encrypt_session_token(&session_id)?
            }
        };
        Ok(build_headers(&auth_key, &self.origin)?)
    }

    /// Fails with [`PesaError::MissingFields`] naming every required key absent from `query`.
    pub fn verify_query(kind: TransactionKind, query: &TransactionQuery) -> Result<()> {
        let missing = kind.missing_fields(query);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PesaError::MissingFields { kind, missing })
        }
    }

    /// Validate `query`, authenticate, and post it to the endpoint for `kind`.
    ///
    /// The response body is returned as-is; its `output_ResponseCode` is not inspected.
    pub async fn dispatch(
        &self,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<TransactionQuery> {
        Self::verify_query(kind, query)?;

        let headers = self.default_headers(None).await?;
        let url = self.endpoints.transaction(kind);
        debug!(%kind, %url, "dispatching transaction");

        let body = self
            .transport
            .post_json(url, headers, query)
            .await
            .inspect_err(|err| warn!(%kind, error = %err, "transaction request failed"))?;

        match body {
            Value::Object(map) => Ok(map),
            other => Err(PesaError::UnexpectedResponse(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    pub async fn customer_to_business(&self, query: &TransactionQuery) -> Result<TransactionQuery> {
        self.dispatch(TransactionKind::CustomerToBusiness, query).await
    }

    pub async fn business_to_customer(&self, query: &TransactionQuery) -> Result<TransactionQuery> {
        self.dispatch(TransactionKind::BusinessToCustomer, query).await
    }

    pub async fn business_to_business(&self, query: &TransactionQuery) -> Result<TransactionQuery> {
        self.dispatch(TransactionKind::BusinessToBusiness, query).await
    }

    pub async fn payment_reversal(&self, query: &TransactionQuery) -> Result<TransactionQuery> {
        self.dispatch(TransactionKind::Reversal, query).await
    }

    pub async fn query_transaction_status(
        &self,
        query: &TransactionQuery,
    ) -> Result<TransactionQuery> {
        self.dispatch(TransactionKind::QueryTransactionStatus, query)
            .await
    }
}

pub struct ClientBuilder<T> {
    credentials: Credentials,
    transport: T,
    environment: Environment,
    base_url: Option<Url>,
    origin_address: String,
    session_cache: Box<dyn SessionCache>,
}

impl<T: HttpTransport> ClientBuilder<T> {
    pub fn new(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            transport,
            environment: Environment::default(),
            base_url: None,
            origin_address: data::config::DEFAULT_ORIGIN.to_string(),
            session_cache: Box::new(NoSessionCache),
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Replace the environment's base URL, e.g. for a different market.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn origin_address(mut self, address: impl Into<String>) -> Self {
        self.origin_address = address.into();
        self
    }

    pub fn session_cache(mut self, cache: impl SessionCache + 'static) -> Self {
        self.session_cache = Box::new(cache);
        self
    }

    pub fn build(self) -> Result<Client<T>> {
        let origin = Origin::parse(&self.origin_address)?;
        let endpoints = match self.base_url {
            Some(base_url) => Endpoints::from_base(base_url)?,
            None => Endpoints::for_environment(self.environment)?,
        };

        let encryptor = KeyEncryptor::new(&self.credentials)?;
        let encrypted_api_key = encryptor.encrypt_api_key()?;
        info!(environment = %self.environment, session = %endpoints.session(), "client ready");

        Ok(Client {
            environment: self.environment,
            endpoints,
            encryptor,
            encrypted_api_key,
            origin,
            transport: self.transport,
            session_cache: self.session_cache,
        })
    }
}
