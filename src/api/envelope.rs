use super::error::{AccessorError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform `{ data }` shape every accessor returns on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope { data: f(self.data) }
    }

    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U, String>) -> ApiResult<Envelope<U>> {
        f(self.data)
            .map(Envelope::new)
            .map_err(AccessorError::Malformed)
    }
}

/// Extract the text of a payload-level `error` field, if one is set
fn payload_error(data: &Value) -> Option<String> {
    let error = data.get("error")?;
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(msg) => Some(msg.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        ),
        _ => Some(String::new()),
    }
}

impl Envelope<Value> {
    /// Turn the raw envelope into a typed one.
    ///
    /// A payload carrying `error` becomes [`AccessorError::Server`]; a missing
    /// or mistyped payload becomes [`AccessorError::Malformed`].
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<Envelope<T>> {
        if self.data.is_null() {
            return Err(AccessorError::Malformed("empty payload".to_string()));
        }
        if let Some(msg) = payload_error(&self.data) {
            return Err(AccessorError::Server(msg));
        }
        serde_json::from_value(self.data)
            .map(Envelope::new)
            .map_err(|e| AccessorError::Malformed(e.to_string()))
    }
}

/// Body of a callable-function response: `{ "result": .. }`, some emulators answer `{ "data": .. }`
#[derive(Debug, Deserialize)]
pub(crate) struct CallableResponse {
    #[serde(alias = "data")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<CallableError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallableError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}
