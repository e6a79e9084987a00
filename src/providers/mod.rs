//! Upstream model providers behind the two capabilities the handlers need.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio_util::sync::CancellationToken;

use crate::error::RelayError;
use crate::model::Message;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// One incrementally delivered piece of a streamed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub content: Option<String>,
}

impl Fragment {
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|text| !text.is_empty())
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self {
            content: Some(text.to_string()),
        }
    }
}

pub type FragmentStream = BoxStream<'static, Result<Fragment, RelayError>>;

/// A provider that streams a chat reply fragment by fragment.
#[async_trait]
pub trait ChatStreamProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn has_credentials(&self) -> bool;

    /// Opens the upstream stream. Errors here happen before any output
    /// exists; errors after this point arrive through the stream.
    async fn stream_chat(
        &self,
        messages: &[Message],
        cancellation_token: CancellationToken,
    ) -> Result<FragmentStream, RelayError>;
}

/// A provider that answers a single prompt with one complete text.
#[async_trait]
pub trait PromptProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    fn has_credentials(&self) -> bool;

    async fn generate(
        &self,
        prompt: &str,
        cancellation_token: CancellationToken,
    ) -> Result<String, RelayError>;
}
