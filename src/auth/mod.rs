//! Identity and credential module for ChatZone.
//!
//! This module provides session identities and roles, the central
//! authorization policy, credential hashing, the moderator roster, the ban
//! list, the picture gallery and login resolution.

mod ban;
mod gallery;
mod identity;
mod login;
mod password;
mod permission;
mod roster;

pub use ban::{BanDuration, BanList, BanRecord};
pub use gallery::Gallery;
pub use identity::{
    normalize_nickname, Identity, Role, ADMIN_ID, BOT_ID, BOT_NICKNAME, DEFAULT_PROFILE_PICTURE,
};
pub use login::{CredentialStore, LoginError};
pub use password::{
    hash_credential, validate_credential, verify_credential, PasswordError, MAX_CREDENTIAL_LENGTH,
};
pub use permission::{authorize, Action, PermissionError};
pub use roster::{ModeratorRecord, ModeratorRoster, NewModerator};
