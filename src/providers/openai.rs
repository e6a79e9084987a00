use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::constants::OPENAI_CHAT_COMPLETIONS;
use crate::error::{RelayError, map_reqwest_error};
use crate::http::CancellableRequest;
use crate::model::Message;
use crate::providers::{ChatStreamProvider, FragmentStream};
use crate::streaming::fragment_stream;

const PROVIDER_NAME: &str = "OpenAI";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

/// Streaming chat completions against an OpenAI-compatible API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        model: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.to_string(),
        }
    }

    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.base_url, OPENAI_CHAT_COMPLETIONS)
    }
}

#[async_trait]
impl ChatStreamProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn stream_chat(
        &self,
        messages: &[Message],
        cancellation_token: CancellationToken,
    ) -> Result<FragmentStream, RelayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::provider_authentication("OPENAI_API_KEY is not configured"))?;

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let request_builder = self
            .client
            .post(self.endpoint_url())
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body);

        let response = CancellableRequest::new(PROVIDER_NAME, cancellation_token)
            .send(request_builder)
            .await?;

        let body_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| map_reqwest_error(PROVIDER_NAME, e)));

        Ok(fragment_stream(body_stream))
    }
}
