use chrono::{DateTime, Utc};

use super::domain::{Application, Message, MessageId, User};
use super::error::{PortalError, ValidationError};

/// Whether `sender` may post on `application`'s thread: its owner, or any officer/admin.
pub fn can_message(application: &Application, sender: &User) -> bool {
    sender.role.is_staff() || application.is_owned_by(&sender.id)
}

/// Append a message from `sender` to `application`'s thread.
///
/// The sender's current name is copied onto the message, and the timestamp never precedes the
/// previous message so thread order always matches time order.
pub fn append_message(
    application: &mut Application,
    sender: &User,
    content: &str,
    id: MessageId,
    now: DateTime<Utc>,
) -> Result<Message, PortalError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyMessage.into());
    }
    if !can_message(application, sender) {
        return Err(PortalError::unauthorized(
            "message on another applicant's application",
            sender.role,
        ));
    }

    let timestamp = match application.last_message() {
        Some(previous) if previous.timestamp > now => previous.timestamp,
        _ => now,
    };

    let message = Message {
        id,
        sender_id: sender.id.clone(),
        sender_name: sender.name.clone(),
        content: content.to_string(),
        timestamp,
    };
    application.messages.push(message.clone());
    Ok(message)
}
