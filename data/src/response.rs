use crate::{DataError, Result};
use derive_getters::Getters;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Response code the session endpoint returns when it refuses to issue a session.
pub const SESSION_REJECTED: &str = "INS-989";
pub const SUCCESS: &str = "INS-0";
pub const RESPONSE_CODE: &str = "output_ResponseCode";
pub const RESPONSE_DESC: &str = "output_ResponseDesc";

/// Body of `GET getSession/`
#[derive(Debug, Clone, Deserialize, Getters)]
pub struct SessionResponse {
    #[serde(rename = "output_SessionID")]
    session_id: Option<String>,
    #[serde(rename = "output_ResponseCode")]
    response_code: String,
    #[serde(rename = "output_ResponseDesc")]
    response_desc: String,
}

impl SessionResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(body)?)
    }

    /// Only a JSON object is accepted; serde would otherwise fill the fields
    /// positionally from an array.
    pub fn from_value(body: Value) -> Result<Self> {
        match body {
            Value::Object(_) => Ok(serde_json::from_value(body)?),
            other => Err(DataError::BadShape {
                expected: "a JSON object",
                got: json_type(&other),
            }),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.response_code == SESSION_REJECTED
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `output_ResponseCode` of a transaction response, if present.
pub fn response_code(body: &Map<String, Value>) -> Option<&str> {
    body.get(RESPONSE_CODE).and_then(Value::as_str)
}

/// `output_ResponseDesc` of a transaction response, if present.
pub fn response_desc(body: &Map<String, Value>) -> Option<&str> {
    body.get(RESPONSE_DESC).and_then(Value::as_str)
}

/// True when the API reports `INS-0` for the call.
pub fn is_success(body: &Map<String, Value>) -> bool {
    response_code(body) == Some(SUCCESS)
}
