use std::time::Duration;

use crate::providers::{ChatStreamProvider, PromptProvider};

#[derive(Clone)]
pub struct RequestContext<'a> {
    pub stream_provider: &'a dyn ChatStreamProvider,
    pub prompt_provider: &'a dyn PromptProvider,
    pub system_prompt: &'a str,
    pub stream_timeout: Duration,
}
