use super::types::{Conversation, Message};

/// Message list for chat-style providers: the directive as a system turn,
/// then every caller turn in order.
pub fn with_system_directive(directive: &str, conversation: &[Message]) -> Conversation {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(Message::system(directive));
    messages.extend_from_slice(conversation);
    messages
}

/// Single prompt string for completion-style providers.
pub fn flatten_prompt(directive: &str, conversation: &[Message]) -> String {
    let mut prompt = String::from(directive);
    for message in conversation {
        prompt.push('\n');
        prompt.push_str(message.role.as_str());
        prompt.push_str(": ");
        prompt.push_str(&message.content);
    }
    prompt
}
