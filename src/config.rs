use clap::Parser;

use crate::constants::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
    DEFAULT_SYSTEM_PROMPT,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "support-chat-relay")]
#[command(about = "chat-support backend relaying conversations to openai and gemini")]
pub struct Config {
    #[arg(long, default_value = "0.0.0.0:3000", help = "server listen address")]
    pub listen: String,

    #[arg(
        long,
        default_value = "info",
        help = "log level (off, error, warn, info, debug, trace)"
    )]
    pub log_level: String,

    #[arg(
        long,
        env = "OPENAI_API_KEY",
        hide_env_values = true,
        help = "api key for the streaming chat provider"
    )]
    pub openai_api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_OPENAI_BASE_URL, help = "openai-compatible api base url")]
    pub openai_base_url: String,

    #[arg(long, default_value = DEFAULT_OPENAI_MODEL, help = "model used by /api/chat")]
    pub openai_model: String,

    #[arg(
        long,
        env = "GEMINI_API_KEY",
        hide_env_values = true,
        help = "api key for the buffered chat provider"
    )]
    pub gemini_api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_GEMINI_BASE_URL, help = "gemini api base url")]
    pub gemini_base_url: String,

    #[arg(long, default_value = DEFAULT_GEMINI_MODEL, help = "model used by /api/chat/buffered")]
    pub gemini_model: String,

    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT, help = "system directive prepended to every conversation")]
    pub system_prompt: String,

    #[arg(
        long,
        default_value = "300",
        help = "overall timeout in seconds for upstream requests"
    )]
    pub request_timeout_seconds: u64,

    #[arg(
        long,
        default_value = "60",
        help = "max idle gap in seconds between upstream stream chunks"
    )]
    pub stream_timeout_seconds: u64,
}

pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.listen.parse::<std::net::SocketAddr>().is_err() {
        return Err(format!("invalid listen address: {}", config.listen));
    }
    validate_base_url("OpenAI", &config.openai_base_url)?;
    validate_base_url("Gemini", &config.gemini_base_url)?;
    if config.stream_timeout_seconds == 0 {
        return Err("stream timeout must be at least one second".to_string());
    }
    Ok(())
}

fn validate_base_url(provider: &str, base_url: &str) -> Result<(), String> {
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(format!(
            "invalid {} base URL (must start with http:// or https://): {}",
            provider, base_url
        ));
    }
    if let Err(e) = url::Url::parse(base_url) {
        return Err(format!("invalid {} base URL format: {}", provider, e));
    }
    Ok(())
}
