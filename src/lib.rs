//! ChatZone - group chat engine
//!
//! Rooms, messages with time-based retention, bans, moderator roles and a
//! report workflow, with an automated participant answering in shared rooms.

pub mod auth;
pub mod bot;
pub mod chat;
pub mod clock;
pub mod config;
pub mod datetime;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod moderation;

pub use auth::{
    authorize, Action, BanDuration, BanRecord, Identity, LoginError, NewModerator,
    PermissionError, Role,
};
pub use bot::{GeminiReplyGenerator, ReplyGenerator};
pub use chat::{JoinError, KickOutcome, Message, Room, StoreEvent, Visibility};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use db::Database;
pub use engine::{ChatZone, Session};
pub use error::{ChatzoneError, Result};
pub use moderation::{ModerationError, Report, ReportStatus, ResolveAction};
