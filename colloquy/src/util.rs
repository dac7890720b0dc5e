//! Small convenience constructors for common types.

use crate::{Message, ProviderId, Role, Session, ValidationError};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::text(Role::System, content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::text(Role::User, content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::text(Role::Assistant, content)
}

pub fn tool_result_message(tool_call_id: impl Into<String>, content: impl Into<String>) -> Message {
    Message::tool_result(tool_call_id, content)
}

/// A fresh session holding `messages` in order.
pub fn session(messages: impl IntoIterator<Item = Message>) -> Result<Session, ValidationError> {
    Session::new().append_all(messages)
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    ProviderId::parse(value)
}
