/// Inbound routes
pub const ROUTE_CHAT_STREAM: &str = "/api/chat";
pub const ROUTE_CHAT_BUFFERED: &str = "/api/chat/buffered";

/// Upstream provider defaults
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const OPENAI_CHAT_COMPLETIONS: &str = "/chat/completions";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const GEMINI_API_KEY_HEADER: &str = "x-goog-api-key";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a Walmart Tech Support Agent. Please try to answer all questions and queries as best as possible";

/// Response headers
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";
pub const HEADER_CACHE_CONTROL: &str = "no-cache";
pub const HEADER_ACCESS_CONTROL_ALLOW_ORIGIN: &str = "*";

/// Error messages
pub const ERROR_TIMEOUT: &str = "upstream stream timeout";
pub const ERROR_CANCELLED: &str = "Request cancelled by client";
pub const ERROR_PROVIDER_UNAVAILABLE: &str = "model provider not reachable";
pub const ERROR_EMPTY_GENERATION: &str = "model provider returned no text";

/// SSE parsing constants
pub const SSE_DATA_PREFIX: &str = "data:";
pub const SSE_DONE_MESSAGE: &str = "[DONE]";
pub const SSE_MESSAGE_BOUNDARY: &[u8] = b"\n\n";

/// Logging prefixes
pub const LOG_PREFIX_SUCCESS: &str = "✅";
pub const LOG_PREFIX_ERROR: &str = "❌";
pub const LOG_PREFIX_WARNING: &str = "⚠️";
pub const LOG_PREFIX_CONN: &str = "↔️";

/// Maximum accepted JSON body size (bytes)
pub const MAX_JSON_BODY_SIZE_BYTES: u64 = 16 * 1024 * 1024;
