pub mod chat_buffered;
pub mod chat_stream;
pub mod context;
pub mod health;

pub use chat_buffered::handle_chat_buffered;
pub use chat_stream::handle_chat_stream;
pub use context::RequestContext;
pub use health::handle_health_check;
