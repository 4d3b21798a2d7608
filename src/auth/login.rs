//! Login resolution for ChatZone.
//!
//! Turns a nickname and an optional credential into a session identity,
//! honoring bans, the moderator roster and the admin credential.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::ban::BanList;
use super::identity::{Identity, Role};
use super::password::{hash_credential, verify_credential};
use super::roster::ModeratorRoster;
use crate::clock::Clock;
use crate::config::AdminConfig;
use crate::datetime::{format_millis, DEFAULT_FORMAT};
use crate::db::{keys, Database};
use crate::Result;

/// Reasons a login attempt is refused. Both are final for the attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The nickname is banned until `expiry` (epoch millis).
    #[error("nickname is banned until {expiry}")]
    Banned {
        /// Ban expiry in epoch milliseconds.
        expiry: i64,
    },

    /// The credential does not match.
    #[error("incorrect credential")]
    BadCredential,

    /// The nickname is empty.
    #[error("nickname is required")]
    EmptyNickname,
}

impl LoginError {
    /// Message suitable for showing to the person logging in.
    pub fn user_message(&self, timezone: &str) -> String {
        match self {
            LoginError::Banned { expiry } => format!(
                "You are banned until {}.",
                format_millis(*expiry, timezone, DEFAULT_FORMAT)
            ),
            LoginError::BadCredential => "Incorrect password.".to_string(),
            LoginError::EmptyNickname => "Please choose a nickname.".to_string(),
        }
    }
}

/// Identity and credential store.
///
/// Owns the moderator roster, the ban list and the admin credential.
pub struct CredentialStore {
    db: Arc<Database>,
    admin: Identity,
    admin_hash: RwLock<String>,
    roster: ModeratorRoster,
    bans: BanList,
}

impl CredentialStore {
    /// Load the store. The admin credential is seeded from config on first run.
    pub async fn load(db: Arc<Database>, clock: Arc<dyn Clock>, admin: &AdminConfig) -> Result<Self> {
        let admin_hash = match db.kv().get_json::<String>(keys::ADMIN_CREDENTIAL).await? {
            Some(hash) => hash,
            None => {
                let hash = hash_credential(&admin.credential)?;
                db.kv().put_json(keys::ADMIN_CREDENTIAL, &hash).await?;
                info!("Admin credential seeded from configuration");
                hash
            }
        };

        let roster = ModeratorRoster::load(db.clone()).await?;
        let bans = BanList::load(db.clone(), clock).await?;

        Ok(Self {
            db,
            admin: Identity::admin(&admin.nickname, &admin.profile_picture),
            admin_hash: RwLock::new(admin_hash),
            roster,
            bans,
        })
    }

    /// Resolve a login attempt.
    ///
    /// Order: ban check, then moderator credential check, then a fresh
    /// plain-user identity.
    pub async fn login(
        &self,
        nickname: &str,
        profile_picture: &str,
        credential: Option<&str>,
    ) -> std::result::Result<Identity, LoginError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(LoginError::EmptyNickname);
        }

        if let Some(expiry) = self.bans.active_ban(nickname).await {
            warn!(nickname = %nickname, expiry, "Login refused: banned");
            return Err(LoginError::Banned { expiry });
        }

        if let Some(moderator) = self.roster.find_by_nickname(nickname).await {
            let supplied = credential.unwrap_or_default();
            if verify_credential(supplied, &moderator.credential_hash).is_err() {
                warn!(nickname = %nickname, "Login refused: bad moderator credential");
                return Err(LoginError::BadCredential);
            }
            let identity = moderator.identity(Some(profile_picture));
            info!(id = %identity.id, nickname = %identity.nickname, "Moderator logged in");
            return Ok(identity);
        }

        let identity = Identity::user(nickname, profile_picture);
        info!(id = %identity.id, nickname = %identity.nickname, "User logged in");
        Ok(identity)
    }

    /// Log in as the administrator.
    pub async fn login_as_admin(&self, credential: &str) -> std::result::Result<Identity, LoginError> {
        let hash = self.admin_hash.read().await;
        if verify_credential(credential, &hash).is_err() {
            warn!("Login refused: bad admin credential");
            return Err(LoginError::BadCredential);
        }
        info!("Administrator logged in");
        Ok(self.admin.clone())
    }

    /// Replace the admin credential. Existing admin sessions stay valid.
    pub async fn update_admin_credential(&self, new_credential: &str) -> Result<()> {
        let hash = hash_credential(new_credential)?;
        let mut current = self.admin_hash.write().await;
        self.db.kv().put_json(keys::ADMIN_CREDENTIAL, &hash).await?;
        *current = hash;

        info!("Admin credential updated");
        Ok(())
    }

    /// The singleton administrator identity.
    pub fn admin_identity(&self) -> &Identity {
        &self.admin
    }

    /// Moderator roster.
    pub fn roster(&self) -> &ModeratorRoster {
        &self.roster
    }

    /// Ban list.
    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    /// Role a [`login`](Self::login) with this nickname yields: provisioned
    /// moderator or plain user. The administrator logs in by credential
    /// alone, so the admin's nickname resolves to a user here.
    pub async fn role_of_nickname(&self, nickname: &str) -> Role {
        if self.roster.find_by_nickname(nickname).await.is_some() {
            return Role::Moderator;
        }
        Role::User
    }
}
