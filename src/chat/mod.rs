//! Chat module for ChatZone.
//!
//! This module provides the room and message side of the engine:
//! - Rooms (public, password-gated, direct chats) and the room registry
//! - Per-room message logs with time-based retention
//! - Presence for the active room

mod message;
mod presence;
mod registry;
mod room;
mod store;

pub use message::{Message, MAX_MESSAGE_LENGTH};
pub use presence::{KickOutcome, MembershipTracker, PresentSet};
pub use registry::RoomRegistry;
pub use room::{direct_room_id, JoinError, Room, Visibility, DEFAULT_ROOM_COLOR};
pub use store::{MessageStore, StoreEvent, DEFAULT_RETENTION_HOURS};
