use super::envelope::Envelope;
use super::error::ApiResult;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Direct client for the cross-origin live-score endpoint.
///
/// This endpoint does not speak the callable protocol: the raw JSON body is
/// wrapped into the same `{ data }` envelope the other operations return.
#[derive(Debug, Clone)]
pub struct LiveScoresClient {
    client: Client,
    url: String,
}

impl LiveScoresClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn post(&self, payload: Value) -> ApiResult<Envelope<Value>> {
        debug!(url = %self.url, "fetching live scores");

        let body: Value = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Envelope::new(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::AccessorError;
    use crate::api::fake::serve;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_raw_body_is_wrapped_in_envelope() {
        let router = Router::new().route(
            "/live",
            post(|Json(body): Json<Value>| async move {
                Json(json!({"echo": body, "matches": []}))
            }),
        );
        let client = LiveScoresClient::new(Client::new(), format!("{}/live", serve(router).await));

        let envelope = client.post(json!({"league_id": 39})).await.unwrap();
        assert_eq!(
            envelope.data,
            json!({"echo": {"league_id": 39}, "matches": []})
        );
    }

    #[tokio::test]
    async fn test_failure_status_is_transport_error() {
        let router = Router::new().route(
            "/live",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let client = LiveScoresClient::new(Client::new(), format!("{}/live", serve(router).await));

        let err = client.post(json!({"league_id": 39})).await.unwrap_err();
        assert!(matches!(err, AccessorError::Transport(_)));
    }
}
