pub mod prompt;
pub mod types;

pub use prompt::{flatten_prompt, with_system_directive};
pub use types::{Conversation, Message, Role};
