//! Room model for ChatZone.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Identity;

/// Theme color for rooms created without one.
pub const DEFAULT_ROOM_COLOR: &str = "#3b82f6";

/// Who may enter a shared room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Anyone may join.
    Public,
    /// Joining requires the room password (the administrator bypasses it).
    PrivatePassword,
    /// A two-party direct chat. Never password-gated.
    Direct,
}

/// Reasons a join is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// Supplied password does not match.
    #[error("incorrect room password")]
    BadPassword,

    /// The room is at capacity.
    #[error("room is full")]
    Full,
}

/// A named message channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Join policy.
    pub visibility: Visibility,
    /// Password for [`Visibility::PrivatePassword`] rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Theme color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Whether this is a two-party direct chat.
    pub is_direct_message: bool,
    /// Sorted participant IDs of a direct chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_pair: Option<(String, String)>,
}

impl Room {
    /// Create a public room with a fixed ID.
    pub fn public(id: impl Into<String>, name: impl Into<String>, color: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visibility: Visibility::Public,
            password: None,
            color: Some(color.unwrap_or_else(|| DEFAULT_ROOM_COLOR.to_string())),
            is_direct_message: false,
            participant_pair: None,
        }
    }

    /// Create a shared room with a fresh ID.
    ///
    /// Public rooms never keep a password.
    pub fn shared(
        name: impl Into<String>,
        visibility: Visibility,
        password: Option<String>,
        color: Option<String>,
    ) -> Self {
        Self {
            id: format!("room-{}", Uuid::new_v4()),
            name: name.into(),
            visibility,
            password: match visibility {
                Visibility::PrivatePassword => password,
                Visibility::Public | Visibility::Direct => None,
            },
            color: Some(color.unwrap_or_else(|| DEFAULT_ROOM_COLOR.to_string())),
            is_direct_message: false,
            participant_pair: None,
        }
    }

    /// Create the direct chat between `initiator` and `partner`.
    pub fn direct(initiator: &Identity, partner: &Identity) -> Self {
        let pair = sorted_pair(&initiator.id, &partner.id);
        Self {
            id: direct_room_id(&initiator.id, &partner.id),
            name: format!("{} & {}", initiator.nickname, partner.nickname),
            visibility: Visibility::Direct,
            password: None,
            color: None,
            is_direct_message: true,
            participant_pair: Some(pair),
        }
    }

    /// Whether `identity_id` is one of the two direct-chat participants.
    pub fn has_participant(&self, identity_id: &str) -> bool {
        match &self.participant_pair {
            Some((a, b)) => a == identity_id || b == identity_id,
            None => false,
        }
    }

    /// The direct-chat participant that is not `viewer_id`.
    pub fn other_participant(&self, viewer_id: &str) -> Option<&str> {
        let (a, b) = self.participant_pair.as_ref()?;
        if a == viewer_id {
            Some(b)
        } else if b == viewer_id {
            Some(a)
        } else {
            None
        }
    }

    /// Check whether `identity` may enter with `supplied_password`.
    ///
    /// The administrator bypasses password gates. Direct chats admit their
    /// two participants and the administrator only.
    pub fn check_join(
        &self,
        identity: &Identity,
        supplied_password: Option<&str>,
    ) -> Result<(), JoinError> {
        if identity.is_admin() {
            return Ok(());
        }
        if self.is_direct_message {
            return if self.has_participant(&identity.id) {
                Ok(())
            } else {
                Err(JoinError::BadPassword)
            };
        }
        match self.visibility {
            Visibility::Public => Ok(()),
            // Only direct rooms carry this, and they are handled above
            Visibility::Direct => Err(JoinError::BadPassword),
            Visibility::PrivatePassword => {
                if supplied_password.is_some() && supplied_password == self.password.as_deref() {
                    Ok(())
                } else {
                    Err(JoinError::BadPassword)
                }
            }
        }
    }
}

fn sorted_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Deterministic ID of the direct chat between two identities.
///
/// # Examples
///
/// ```
/// use chatzone::chat::direct_room_id;
///
/// assert_eq!(direct_room_id("user-b", "user-a"), "private-user-a-user-b");
/// assert_eq!(direct_room_id("user-a", "user-b"), direct_room_id("user-b", "user-a"));
/// ```
pub fn direct_room_id(a: &str, b: &str) -> String {
    let (first, second) = sorted_pair(a, b);
    format!("private-{first}-{second}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, DEFAULT_PROFILE_PICTURE};

    fn user(nickname: &str) -> Identity {
        Identity::user(nickname, DEFAULT_PROFILE_PICTURE)
    }

    #[test]
    fn test_public_room() {
        let room = Room::public("general", "General", None);
        assert_eq!(room.visibility, Visibility::Public);
        assert_eq!(room.color.as_deref(), Some(DEFAULT_ROOM_COLOR));
        assert!(!room.is_direct_message);
        assert!(room.check_join(&user("alice"), None).is_ok());
        assert!(room.check_join(&user("alice"), Some("anything")).is_ok());
    }

    #[test]
    fn test_shared_room_ids_are_unique() {
        let a = Room::shared("A", Visibility::Public, None, None);
        let b = Room::shared("A", Visibility::Public, None, None);
        assert!(a.id.starts_with("room-"));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_public_room_drops_password() {
        let room = Room::shared("A", Visibility::Public, Some("pw".into()), None);
        assert!(room.password.is_none());
    }

    #[test]
    fn test_password_room() {
        let room = Room::shared(
            "Secret",
            Visibility::PrivatePassword,
            Some("hunter2".into()),
            Some("#000000".into()),
        );
        let alice = user("alice");

        assert_eq!(room.check_join(&alice, None), Err(JoinError::BadPassword));
        assert_eq!(
            room.check_join(&alice, Some("hunter3")),
            Err(JoinError::BadPassword)
        );
        assert!(room.check_join(&alice, Some("hunter2")).is_ok());
    }

    #[test]
    fn test_admin_bypasses_password() {
        let room = Room::shared("Secret", Visibility::PrivatePassword, Some("pw".into()), None);
        let admin = Identity::admin("Admin", DEFAULT_PROFILE_PICTURE);
        assert!(room.check_join(&admin, None).is_ok());
    }

    #[test]
    fn test_direct_room() {
        let alice = user("alice");
        let bob = user("bob");

        let ab = Room::direct(&alice, &bob);
        let ba = Room::direct(&bob, &alice);

        assert_eq!(ab.id, ba.id);
        assert!(ab.is_direct_message);
        assert_eq!(ab.visibility, Visibility::Direct);
        assert_eq!(ab.name, "alice & bob");
        assert!(ab.password.is_none());
        assert_eq!(ab.other_participant(&alice.id), Some(bob.id.as_str()));
        assert_eq!(ab.other_participant(&bob.id), Some(alice.id.as_str()));
        assert_eq!(ab.other_participant("user-nobody"), None);
    }

    #[test]
    fn test_direct_room_admits_participants_only() {
        let alice = user("alice");
        let bob = user("bob");
        let eve = user("eve");
        let room = Room::direct(&alice, &bob);

        assert!(room.check_join(&alice, None).is_ok());
        assert!(room.check_join(&bob, None).is_ok());
        assert_eq!(room.check_join(&eve, None), Err(JoinError::BadPassword));
    }

    #[test]
    fn test_room_json_shape() {
        let room = Room::public("general", "General", None);
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["visibility"], "PUBLIC");
        assert_eq!(json["isDirectMessage"], false);
        assert!(json.get("password").is_none());
    }
}
