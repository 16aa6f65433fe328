use crate::error::TransportError;
use async_trait::async_trait;
use data::TransactionQuery;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// The two HTTP shapes the API needs. Implementations may use reqwest or in-memory fakes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, url: &Url, headers: HeaderMap) -> Result<Value, TransportError>;

    async fn post_json(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: &TransactionQuery,
    ) -> Result<Value, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// TLS verification stays on; a `timeout` of `None` or zero leaves requests unbounded.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .tcp_nodelay(true)
            .pool_idle_timeout(IDLE_TIMEOUT);
        if let Some(timeout) = timeout.filter(|timeout| !timeout.is_zero()) {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &Url, headers: HeaderMap) -> Result<Value, TransportError> {
        let response = self.http.get(url.clone()).headers(headers).send().await?;
        debug!(%url, status = %response.status(), "GET");
        Ok(response.json::<Value>().await?)
    }

    async fn post_json(
        &self,
        url: &Url,
        headers: HeaderMap,
        body: &TransactionQuery,
    ) -> Result<Value, TransportError> {
        let response = self
            .http
            .post(url.clone())
            .headers(headers)
            .json(body)
            .send()
            .await?;
        debug!(%url, status = %response.status(), "POST");
        Ok(response.json::<Value>().await?)
    }
}
