use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::constants::{ERROR_EMPTY_GENERATION, GEMINI_API_KEY_HEADER};
use crate::error::RelayError;
use crate::http::CancellableRequest;
use crate::http::client::handle_json_response;
use crate::providers::PromptProvider;

const PROVIDER_NAME: &str = "Gemini";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Joined text parts of the first candidate, or `None` when there is
    /// no candidate, the candidate carries no content, or every part is empty.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<String>();
        (!text.is_empty()).then_some(text)
    }

    fn missing_text_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return format!("{} (prompt blocked: {})", ERROR_EMPTY_GENERATION, reason);
        }
        match self
            .candidates
            .first()
            .and_then(|candidate| candidate.finish_reason.as_deref())
        {
            Some(reason) => format!("{} (finish reason: {})", ERROR_EMPTY_GENERATION, reason),
            None => ERROR_EMPTY_GENERATION.to_string(),
        }
    }
}

/// Single-shot `generateContent` calls against the Gemini API.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiProvider {
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
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl PromptProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(
        &self,
        prompt: &str,
        cancellation_token: CancellationToken,
    ) -> Result<String, RelayError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::provider_authentication("GEMINI_API_KEY is not configured"))?;

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let request_builder = self
            .client
            .post(self.endpoint_url())
            .header(GEMINI_API_KEY_HEADER, api_key)
            .json(&body);

        let response = CancellableRequest::new(PROVIDER_NAME, cancellation_token.clone())
            .send(request_builder)
            .await?;

        let reply: GenerateContentResponse =
            handle_json_response(PROVIDER_NAME, response, cancellation_token).await?;

        reply
            .text()
            .ok_or_else(|| RelayError::provider_response(reply.missing_text_reason()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_body_wraps_prompt_in_single_part() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {"role": "model", "parts": [{"text": "Sorry to "}, {"text": "hear that."}]},
                    "finishReason": "STOP"
                },
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(reply.text().as_deref(), Some("Sorry to hear that."));
    }

    #[test]
    fn safety_stop_without_content_has_no_text() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }))
        .unwrap();
        assert_eq!(reply.text(), None);
        assert!(reply.missing_text_reason().contains("SAFETY"));
    }

    #[test]
    fn empty_parts_count_as_no_text() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": ""}, {}]}, "finishReason": "STOP"}]
        }))
        .unwrap();
        assert_eq!(reply.text(), None);
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(reply.text(), None);
        assert!(reply.missing_text_reason().contains("SAFETY"));
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new(
            reqwest::Client::new(),
            "https://generativelanguage.googleapis.com/v1beta/",
            Some("key".to_string()),
            "gemini-1.5-flash",
        );
        assert!(provider.has_credentials());
        assert_eq!(
            provider.endpoint_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
