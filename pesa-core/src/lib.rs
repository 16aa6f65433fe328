//! Client for the Vodacom M-Pesa open API.
//!
//! Every request is authorized with an RSA encrypted bearer token: the API key
//! for `getSession/`, then the returned session id for transaction calls.
//!
//! ```no_run
//! # async fn run() -> pesa_core::Result<()> {
//! use pesa_core::{Client, TransactionQuery};
//!
//! let client = Client::new("keys.json", "testing")?;
//! let query: TransactionQuery = serde_json::from_str(r#"{
//!     "input_Country": "TZN",
//!     "input_QueryReference": "000000000000000000001",
//!     "input_ServiceProviderCode": "000000",
//!     "input_ThirdPartyConversationID": "asv02e5958774f7ba228d83d0d689761"
//! }"#).unwrap();
//! let response = client.query_transaction_status(&query).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod crypto;
pub mod error;
pub mod headers;
pub mod session;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use crypto::{EncryptedKey, KeyEncryptor, encrypt};
pub use error::{AuthError, Error, ErrorKind, PesaError, Result, TransportError};
pub use session::{NoSessionCache, SessionCache, TtlSessionCache};
pub use transport::{HttpTransport, ReqwestTransport};

pub use data::{ClientConfig, Credentials, Environment, TransactionKind, TransactionQuery};
