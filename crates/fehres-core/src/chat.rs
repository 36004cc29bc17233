//! Helpers for building the conversational context sent with an answer
//! request.

use crate::models::{ChatMessage, ChatRole};

/// Prefix used for assistant messages that record a failed turn.
pub const ERROR_PREFIX: &str = "Error: ";

/// Returns the most recent `window` user/assistant messages, oldest first.
///
/// System messages and assistant messages recording a failed turn are
/// skipped: neither is something the backend should treat as dialogue.
pub fn recent_turns(history: &[ChatMessage], window: usize) -> Vec<&ChatMessage> {
    let mut turns: Vec<&ChatMessage> = history
        .iter()
        .rev()
        .filter(|m| match m.role {
            ChatRole::User => true,
            ChatRole::Assistant => !is_error_turn(m),
            ChatRole::System => false,
        })
        .take(window)
        .collect();
    turns.reverse();
    turns
}

/// Assistant message content for a turn whose answer request failed.
pub fn error_turn_content(message: &str) -> String {
    format!("{}{}", ERROR_PREFIX, message)
}

fn is_error_turn(message: &ChatMessage) -> bool {
    message.role == ChatRole::Assistant
        && message.metadata.is_none()
        && message.content.starts_with(ERROR_PREFIX)
}
