//! Moderator roster, provisioned by the administrator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::identity::{normalize_nickname, Identity, Role, DEFAULT_PROFILE_PICTURE};
use super::password::hash_credential;
use crate::db::{keys, Database};
use crate::{ChatzoneError, Result};

/// A stored moderator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorRecord {
    /// Stable ID reused by every session of this moderator.
    pub id: String,
    /// Nickname as provisioned.
    pub nickname: String,
    /// Display color.
    #[serde(default)]
    pub color: Option<String>,
    /// Picture used when the session does not pick one.
    pub profile_picture: String,
    /// Argon2id hash of the credential.
    pub credential_hash: String,
}

impl ModeratorRecord {
    /// Session identity for this moderator.
    pub fn identity(&self, profile_picture: Option<&str>) -> Identity {
        Identity {
            id: self.id.clone(),
            nickname: self.nickname.clone(),
            role: Role::Moderator,
            profile_picture: profile_picture
                .unwrap_or(&self.profile_picture)
                .to_string(),
            color: self.color.clone(),
        }
    }

    fn matches(&self, nickname: &str) -> bool {
        normalize_nickname(&self.nickname) == normalize_nickname(nickname)
    }
}

/// Request to provision a moderator.
#[derive(Debug, Clone)]
pub struct NewModerator {
    /// Nickname, unique among moderators (case-insensitive).
    pub nickname: String,
    /// Plaintext credential.
    pub credential: String,
    /// Display color.
    pub color: Option<String>,
    /// Profile picture.
    pub profile_picture: Option<String>,
}

impl NewModerator {
    /// Create a request with no color and the default picture.
    pub fn new(nickname: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            credential: credential.into(),
            color: None,
            profile_picture: None,
        }
    }

    /// Set the display color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Roster persisted under [`keys::MODERATORS`].
pub struct ModeratorRoster {
    db: Arc<Database>,
    moderators: RwLock<Vec<ModeratorRecord>>,
}

impl ModeratorRoster {
    /// Load the roster.
    pub async fn load(db: Arc<Database>) -> Result<Self> {
        let moderators = db
            .kv()
            .get_json(keys::MODERATORS)
            .await?
            .unwrap_or_default();
        Ok(Self {
            db,
            moderators: RwLock::new(moderators),
        })
    }

    /// Add a moderator. Fails if the nickname is already on the roster.
    pub async fn provision(&self, new: NewModerator) -> Result<Identity> {
        let nickname = new.nickname.trim().to_string();
        if nickname.is_empty() {
            return Err(ChatzoneError::Validation("nickname is required".to_string()));
        }
        let credential_hash = hash_credential(&new.credential)?;

        let mut moderators = self.moderators.write().await;
        if moderators.iter().any(|m| m.matches(&nickname)) {
            return Err(ChatzoneError::Validation(format!(
                "{nickname} is already a moderator"
            )));
        }

        let record = ModeratorRecord {
            id: format!("mod-{}", Uuid::new_v4()),
            nickname,
            color: new.color,
            profile_picture: new
                .profile_picture
                .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
            credential_hash,
        };
        let identity = record.identity(None);
        let mut next = moderators.clone();
        next.push(record);
        self.db.kv().put_json(keys::MODERATORS, &next).await?;
        *moderators = next;

        info!(id = %identity.id, nickname = %identity.nickname, "Moderator provisioned");
        Ok(identity)
    }

    /// Remove a moderator by ID. Active sessions keep their role.
    pub async fn revoke(&self, id: &str) -> Result<bool> {
        let mut moderators = self.moderators.write().await;
        let next: Vec<ModeratorRecord> =
            moderators.iter().filter(|m| m.id != id).cloned().collect();
        if next.len() == moderators.len() {
            return Ok(false);
        }
        self.db.kv().put_json(keys::MODERATORS, &next).await?;
        *moderators = next;

        info!(id = %id, "Moderator revoked");
        Ok(true)
    }

    /// Look up a moderator by nickname (case-insensitive).
    pub async fn find_by_nickname(&self, nickname: &str) -> Option<ModeratorRecord> {
        self.moderators
            .read()
            .await
            .iter()
            .find(|m| m.matches(nickname))
            .cloned()
    }

    /// All moderators in provisioning order.
    pub async fn list(&self) -> Vec<Identity> {
        self.moderators
            .read()
            .await
            .iter()
            .map(|m| m.identity(None))
            .collect()
    }
}
