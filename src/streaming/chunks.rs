use serde_json::Value;

use crate::error::RelayError;
use crate::http::client::extract_error_message;
use crate::providers::Fragment;

pub fn extract_first_choice(chunk: &Value) -> Option<&Value> {
    chunk
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|array| array.first())
}

/// Decodes one `data:` record of a chat-completion stream.
///
/// A record without `choices[0].delta.content` is a valid fragment with no
/// content (role announcements, finish markers). A record carrying an
/// `error` object, or one that is not JSON at all, fails the stream.
pub fn parse_chunk(data: &str) -> Result<Fragment, RelayError> {
    let chunk: Value = serde_json::from_str(data)
        .map_err(|e| RelayError::provider_response(format!("malformed stream chunk: {}", e)))?;

    if let Some(error) = chunk.get("error") {
        let message = extract_error_message(error)
            .unwrap_or_else(|| "provider reported an error mid-stream".to_string());
        return Err(RelayError::provider_response(message));
    }

    let content = extract_first_choice(&chunk)
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(content_text);

    Ok(Fragment { content })
}

fn content_text(content_value: &Value) -> Option<String> {
    match content_value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let mut buffer = String::new();
            for item in items {
                if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
                    buffer.push_str(text);
                }
            }
            Some(buffer)
        }
        _ => None,
    }
}
