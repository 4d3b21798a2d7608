//! Identity model for ChatZone.
//!
//! An identity lives for one connected session. Only moderators (through the
//! roster) and the singleton administrator are known across sessions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Picture assigned when nothing else is chosen.
pub const DEFAULT_PROFILE_PICTURE: &str = "https://api.dicebear.com/8.x/initials/svg?seed=CZ";

/// ID of the automated participant.
pub const BOT_ID: &str = "bot-gemini";

/// Nickname of the automated participant.
pub const BOT_NICKNAME: &str = "GeminiBot";

const BOT_PICTURE: &str = "https://api.dicebear.com/8.x/bottts/svg?seed=GeminiBot";

/// ID of the singleton administrator.
pub const ADMIN_ID: &str = "admin";

/// Session role, decided once at login.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Regular participant.
    #[default]
    User = 0,
    /// Provisioned moderator.
    Moderator = 1,
    /// The administrator.
    Admin = 2,
}

impl Role {
    /// Stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Moderator => "MODERATOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Check if this role has at least the required level.
    ///
    /// # Examples
    ///
    /// ```
    /// use chatzone::auth::Role;
    ///
    /// assert!(Role::Admin.can_access(Role::Moderator));
    /// assert!(!Role::User.can_access(Role::Moderator));
    /// ```
    pub fn can_access(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "MODERATOR" => Ok(Role::Moderator),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Lower-case a nickname for ban and roster lookups.
pub fn normalize_nickname(nickname: &str) -> String {
    nickname.trim().to_lowercase()
}

/// A participant as seen by rooms, messages and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Unique identity ID.
    pub id: String,
    /// Display nickname.
    pub nickname: String,
    /// Role for this session.
    pub role: Role,
    /// Profile picture URL.
    pub profile_picture: String,
    /// Display color (moderators).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Identity {
    /// Fresh plain-user identity with a newly generated ID.
    pub fn user(nickname: impl Into<String>, profile_picture: impl Into<String>) -> Self {
        Self {
            id: format!("user-{}", Uuid::new_v4()),
            nickname: nickname.into(),
            role: Role::User,
            profile_picture: profile_picture.into(),
            color: None,
        }
    }

    /// The singleton administrator.
    pub fn admin(nickname: impl Into<String>, profile_picture: impl Into<String>) -> Self {
        Self {
            id: ADMIN_ID.to_string(),
            nickname: nickname.into(),
            role: Role::Admin,
            profile_picture: profile_picture.into(),
            color: None,
        }
    }

    /// The automated participant.
    pub fn bot() -> Self {
        Self {
            id: BOT_ID.to_string(),
            nickname: BOT_NICKNAME.to_string(),
            role: Role::User,
            profile_picture: BOT_PICTURE.to_string(),
            color: None,
        }
    }

    /// Whether this is the automated participant.
    pub fn is_bot(&self) -> bool {
        self.id == BOT_ID
    }

    /// Whether this is the administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this identity holds moderation powers.
    pub fn is_staff(&self) -> bool {
        self.role >= Role::Moderator
    }
}
