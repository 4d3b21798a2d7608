//! Room registry for ChatZone.
//!
//! Holds every room known to the process, shared across sessions.

use tokio::sync::RwLock;
use tracing::info;

use super::room::{JoinError, Room, Visibility};
use crate::auth::Identity;
use crate::config::DefaultRoom;
use crate::{ChatzoneError, Result};

/// Registry of shared rooms and direct chats.
///
/// Rooms are kept in creation order; nothing is ever removed while the
/// process runs.
pub struct RoomRegistry {
    rooms: RwLock<Vec<Room>>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(Vec::new()),
        }
    }

    /// Create a registry seeded with public rooms.
    pub fn with_defaults(defaults: &[DefaultRoom]) -> Self {
        let mut rooms: Vec<Room> = Vec::with_capacity(defaults.len());
        for room in defaults {
            if rooms.iter().any(|r| r.id == room.id) {
                continue;
            }
            rooms.push(Room::public(&room.id, &room.name, room.color.clone()));
        }
        Self {
            rooms: RwLock::new(rooms),
        }
    }

    /// Create a shared room.
    ///
    /// Password rooms need a non-empty password. Callers are expected to have
    /// checked that the actor may create rooms.
    pub async fn create_room(
        &self,
        name: &str,
        visibility: Visibility,
        password: Option<&str>,
        color: Option<&str>,
    ) -> Result<Room> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatzoneError::Validation("room name is required".to_string()));
        }
        if visibility == Visibility::Direct {
            return Err(ChatzoneError::Validation(
                "direct chats are opened between two users, not created".to_string(),
            ));
        }
        if visibility == Visibility::PrivatePassword && password.map_or(true, str::is_empty) {
            return Err(ChatzoneError::Validation(
                "password rooms need a password".to_string(),
            ));
        }

        let room = Room::shared(
            name,
            visibility,
            password.map(str::to_string),
            color.map(str::to_string),
        );
        self.rooms.write().await.push(room.clone());

        info!(room_id = %room.id, name = %room.name, "Room created");
        Ok(room)
    }

    /// Get a room by ID.
    pub async fn get(&self, id: &str) -> Option<Room> {
        self.rooms.read().await.iter().find(|r| r.id == id).cloned()
    }

    /// Check whether `identity` may enter `room`.
    pub async fn join_room(
        &self,
        room: &Room,
        identity: &Identity,
        password: Option<&str>,
    ) -> std::result::Result<Room, JoinError> {
        room.check_join(identity, password)?;
        Ok(room.clone())
    }

    /// Return the direct chat between two identities, registering it on first use.
    ///
    /// Both argument orders resolve to the same room.
    pub async fn open_or_create_direct_chat(&self, a: &Identity, b: &Identity) -> Result<Room> {
        if a.id == b.id {
            return Err(ChatzoneError::Validation(
                "cannot open a direct chat with yourself".to_string(),
            ));
        }

        let id = super::room::direct_room_id(&a.id, &b.id);
        let mut rooms = self.rooms.write().await;
        if let Some(existing) = rooms.iter().find(|r| r.id == id) {
            return Ok(existing.clone());
        }

        let room = Room::direct(a, b);
        rooms.push(room.clone());
        info!(room_id = %room.id, "Direct chat opened");
        Ok(room)
    }

    /// Rooms `identity` can see: every shared room, plus its own direct chats.
    pub async fn list_visible(&self, identity: &Identity) -> Vec<Room> {
        self.rooms
            .read()
            .await
            .iter()
            .filter(|r| !r.is_direct_message || r.has_participant(&identity.id))
            .cloned()
            .collect()
    }

    /// Number of registered rooms, direct chats included.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
