use super::envelope::{CallableResponse, Envelope};
use super::error::{AccessorError, ApiResult};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

/// Client for the serverless callable-function transport.
///
/// Every operation is a POST to `{base_url}/{operation}` with the request
/// wrapped as `{ "data": payload }`.
#[derive(Debug, Clone)]
pub struct CallableClient {
    client: Client,
    base_url: String,
}

impl CallableClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    pub async fn call(&self, operation: &str, payload: Value) -> ApiResult<Envelope<Value>> {
        let url = self.endpoint(operation);
        debug!(%url, "invoking callable");

        let response = self
            .client
            .post(&url)
            .json(&json!({ "data": payload }))
            .send()
            .await?;

        let status = response.status();
        let body: CallableResponse = response.json().await?;

        if let Some(err) = body.error {
            let message = if err.message.is_empty() {
                err.status.unwrap_or_default()
            } else {
                err.message
            };
            return Err(AccessorError::Server(message));
        }
        if !status.is_success() {
            return Err(AccessorError::Malformed(format!(
                "{} returned {} without an error body",
                operation, status
            )));
        }

        Ok(Envelope::new(body.result.unwrap_or(Value::Null)))
    }
}
