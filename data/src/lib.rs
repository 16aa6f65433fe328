pub mod config;
pub mod environment;
pub mod error;
pub mod response;
pub mod transaction;

pub use config::{ClientConfig, Credentials};
pub use environment::{Endpoints, Environment};
pub use error::{ConfigError, DataError, Error, Result};
pub use response::SessionResponse;
pub use transaction::{TransactionKind, TransactionQuery};
