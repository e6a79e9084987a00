use serde_json::{Value, json};

use crate::handlers::RequestContext;
use crate::logging::LogConfig;

/// Liveness report. Never touches the providers and never echoes secrets.
pub fn handle_health_check(context: &RequestContext<'_>) -> Value {
    let response = json!({
        "status": "ok",
        "providers": {
            "stream": {
                "name": context.stream_provider.name(),
                "model": context.stream_provider.model(),
                "credentials_configured": context.stream_provider.has_credentials()
            },
            "buffered": {
                "name": context.prompt_provider.name(),
                "model": context.prompt_provider.model(),
                "credentials_configured": context.prompt_provider.has_credentials()
            }
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": crate::VERSION
    });
    if LogConfig::get().debug_enabled {
        log::debug!(
            "health check response: {}",
            serde_json::to_string_pretty(&response).unwrap_or_default()
        );
    }
    response
}
