//! Chat message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Identity;

/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// An immutable chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message ID.
    pub id: String,
    /// Snapshot of the author at send time.
    pub author: Identity,
    /// Message text.
    pub text: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh ID.
    pub fn new(author: Identity, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("msg-{}", Uuid::new_v4()),
            author,
            text: text.into(),
            created_at,
        }
    }

    /// Format the message for a transcript line.
    pub fn format(&self) -> String {
        format!("{}: {}", self.author.nickname, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_PROFILE_PICTURE;

    #[test]
    fn test_new_message() {
        let author = Identity::user("alice", DEFAULT_PROFILE_PICTURE);
        let now = Utc::now();
        let msg = Message::new(author.clone(), "Hello!", now);

        assert!(msg.id.starts_with("msg-"));
        assert_eq!(msg.author, author);
        assert_eq!(msg.text, "Hello!");
        assert_eq!(msg.created_at, now);
        assert_eq!(msg.format(), "alice: Hello!");
    }

    #[test]
    fn test_ids_are_unique() {
        let author = Identity::bot();
        let now = Utc::now();
        assert_ne!(
            Message::new(author.clone(), "a", now).id,
            Message::new(author, "a", now).id
        );
    }
}
