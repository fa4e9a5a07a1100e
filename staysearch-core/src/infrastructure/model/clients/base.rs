//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Base HTTP client with shared functionality
#[derive(Debug, Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(id: String, endpoint: String, timeout: Duration) -> Result<Self, ModelError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ModelError::Client {
                provider: id.clone(),
                source,
            })?;
        Ok(Self { id, endpoint, http })
    }

    /// Build URL from endpoint and path
    pub fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// Post JSON with the given headers, turning error statuses into
    /// [`ModelError::Status`] with the service's own message when present.
    pub async fn post_json<Req, Res>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &Req,
    ) -> Result<Res, ModelError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::network(&self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                provider: self.id.clone(),
                status,
                message: error_message(&text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::invalid_response(&self.id, e.to_string()))
    }
}

/// Pulls `error.message` out of a JSON error body, or returns the body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
