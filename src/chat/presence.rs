//! Presence tracking for the active room.
//!
//! The present set is recomputed every time a viewer activates a room. It is
//! not the same thing as who may enter the room.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::room::Room;
use crate::auth::{normalize_nickname, Identity};

/// Result of removing someone from a present set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickOutcome {
    /// Another participant was removed.
    Removed,
    /// The viewer removed itself and must leave the room.
    RemovedSelf,
    /// Nobody with that ID was present.
    NotPresent,
}

/// Who the viewer sees in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentSet {
    room_id: String,
    viewer_id: String,
    members: Vec<Identity>,
}

impl PresentSet {
    /// Room this set belongs to.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Present identities, viewer first.
    pub fn members(&self) -> &[Identity] {
        &self.members
    }

    /// Whether `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Find a present identity by nickname (case-insensitive).
    pub fn find_by_nickname(&self, nickname: &str) -> Option<&Identity> {
        let wanted = normalize_nickname(nickname);
        self.members
            .iter()
            .find(|m| normalize_nickname(&m.nickname) == wanted)
    }

    /// Remove `user_id` from the set.
    pub fn kick(&mut self, user_id: &str) -> KickOutcome {
        let Some(index) = self.members.iter().position(|m| m.id == user_id) else {
            return KickOutcome::NotPresent;
        };
        self.members.remove(index);
        if user_id == self.viewer_id {
            KickOutcome::RemovedSelf
        } else {
            KickOutcome::Removed
        }
    }
}

/// Directory of identities with a live session, used to resolve direct-chat
/// partners.
///
/// Only live sessions are listed; a partner who logged out resolves to
/// nothing.
pub struct MembershipTracker {
    known: RwLock<HashMap<String, Identity>>,
}

impl MembershipTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            known: RwLock::new(HashMap::new()),
        }
    }

    /// Record a logged-in identity.
    pub async fn register(&self, identity: &Identity) {
        self.known
            .write()
            .await
            .insert(identity.id.clone(), identity.clone());
    }

    /// Drop an identity at logout. Returns false if it was not known.
    pub async fn forget(&self, id: &str) -> bool {
        self.known.write().await.remove(id).is_some()
    }

    /// Look up a live identity by ID.
    pub async fn lookup(&self, id: &str) -> Option<Identity> {
        self.known.read().await.get(id).cloned()
    }

    /// Number of live identities.
    pub async fn known_count(&self) -> usize {
        self.known.read().await.len()
    }

    /// Compute the present set for `viewer` entering `room`.
    ///
    /// A direct chat shows the viewer and the partner, if the partner can be
    /// resolved. Any other room shows the viewer and the automated
    /// participant.
    pub async fn activate(&self, room: &Room, viewer: &Identity) -> PresentSet {
        let mut members = vec![viewer.clone()];

        if room.is_direct_message {
            if let Some(partner_id) = room.other_participant(&viewer.id) {
                if let Some(partner) = self.lookup(partner_id).await {
                    members.push(partner);
                }
            }
        } else {
            members.push(Identity::bot());
        }

        PresentSet {
            room_id: room.id.clone(),
            viewer_id: viewer.id.clone(),
            members,
        }
    }
}

impl Default for MembershipTracker {
    fn default() -> Self {
        Self::new()
    }
}
