use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::check_cancelled;
use crate::error::{RelayError, map_reqwest_error};

/// Sends a prepared upstream request, giving up as soon as the token fires.
pub struct CancellableRequest<'a> {
    provider: &'a str,
    token: CancellationToken,
}

impl<'a> CancellableRequest<'a> {
    pub fn new(provider: &'a str, token: CancellationToken) -> Self {
        Self { provider, token }
    }

    pub async fn send(
        &self,
        request_builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, RelayError> {
        check_cancelled!(self.token);

        tokio::select! {
            result = request_builder.send() => {
                let response = result.map_err(|err| map_reqwest_error(self.provider, err))?;
                ensure_success(self.provider, response).await
            }
            _ = self.token.cancelled() => {
                Err(RelayError::request_cancelled())
            }
        }
    }
}

/// Turns a non-2xx upstream answer into a `RelayError` carrying the
/// provider's own message when it sent one.
pub async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, RelayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| json.get("error").and_then(extract_error_message))
        .unwrap_or_else(|| format!("{} error: {}", provider, status));

    log::error!("{} responded {}: {}", provider, status.as_u16(), message);

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        Err(RelayError::provider_authentication(&message))
    } else {
        Err(RelayError::provider_response(message))
    }
}

/// Both providers report failures as `{"error": {"message": ...}}`; some
/// compatible servers send a bare string instead.
pub fn extract_error_message(error: &Value) -> Option<String> {
    match error {
        Value::Object(obj) => obj
            .get("message")
            .and_then(|m| m.as_str())
            .map(|s| s.to_string()),
        Value::String(message) => Some(message.clone()),
        _ => None,
    }
}

pub async fn handle_json_response<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
    cancellation_token: CancellationToken,
) -> Result<T, RelayError> {
    check_cancelled!(cancellation_token);

    tokio::select! {
        result = response.json::<T>() => {
            result.map_err(|e| {
                RelayError::provider_response(format!("invalid JSON from {}: {}", provider, e))
            })
        }
        _ = cancellation_token.cancelled() => {
            Err(RelayError::request_cancelled())
        }
    }
}
