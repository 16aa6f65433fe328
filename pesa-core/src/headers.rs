use crate::crypto::EncryptedKey;
use crate::error::{AuthError, PesaError, Result};
use data::config::DEFAULT_ORIGIN;
use data::environment::API_HOST;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HOST, HeaderMap, HeaderValue, ORIGIN};

/// Value sent in the `Origin` header, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    address: String,
    value: HeaderValue,
}

impl Origin {
    pub fn parse(address: &str) -> Result<Self> {
        let value = HeaderValue::from_str(address).map_err(|_| {
            PesaError::InvalidArgument(format!(
                "origin address {address:?} is not a valid header value"
            ))
        })?;
        Ok(Self {
            address: address.to_string(),
            value,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            address: DEFAULT_ORIGIN.to_string(),
            value: HeaderValue::from_static(DEFAULT_ORIGIN),
        }
    }
}

/// Headers every API call carries, authorized with `auth_key`.
pub fn build_headers(
    auth_key: &EncryptedKey,
    origin: &Origin,
) -> std::result::Result<HeaderMap, AuthError> {
    let bearer = HeaderValue::from_str(&format!("Bearer {auth_key}"))
        .map_err(|_| AuthError::InvalidToken)?;

    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(HOST, HeaderValue::from_static(API_HOST));
    headers.insert(ORIGIN, origin.value.clone());
    Ok(headers)
}
