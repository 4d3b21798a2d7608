//! Per-room message logs with time-based retention.
//!
//! Expiry is lazy: a room's log is trimmed only when that room is read or
//! written, and on load. There is no background sweep.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

use super::message::Message;
use crate::clock::Clock;
use crate::db::{keys, Database};
use crate::Result;

/// Default retention window.
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Capacity of the event channel.
const EVENT_CAPACITY: usize = 256;

/// Change notification for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A message was appended to a room.
    Appended {
        /// Room ID.
        room_id: String,
        /// The stored message.
        message: Message,
    },
    /// A message was removed from a room.
    Deleted {
        /// Room ID.
        room_id: String,
        /// ID of the removed message.
        message_id: String,
    },
}

/// Drop every message with `now - created_at >= retention`.
///
/// Returns the number of evicted messages.
fn evict(log: &mut Vec<Message>, now: DateTime<Utc>, retention: Duration) -> usize {
    let before = log.len();
    log.retain(|m| now - m.created_at < retention);
    before - log.len()
}

type RoomLog = Arc<Mutex<Vec<Message>>>;

/// Owner of every room's message log, persisted under [`keys::MESSAGES`].
///
/// Each room has its own lock; the outer map lock is only held to find or
/// create a room's log.
pub struct MessageStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    retention: Duration,
    logs: RwLock<HashMap<String, RoomLog>>,
    persist_lock: Mutex<()>,
    events: broadcast::Sender<StoreEvent>,
}

impl MessageStore {
    /// Load all logs, dropping expired messages.
    pub async fn load(db: Arc<Database>, clock: Arc<dyn Clock>, retention: Duration) -> Result<Self> {
        let stored: HashMap<String, Vec<Message>> =
            db.kv().get_json(keys::MESSAGES).await?.unwrap_or_default();

        let now = clock.now();
        let mut evicted = 0;
        let mut logs = HashMap::with_capacity(stored.len());
        for (room_id, mut log) in stored {
            evicted += evict(&mut log, now, retention);
            logs.insert(room_id, Arc::new(Mutex::new(log)));
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let store = Self {
            db,
            clock,
            retention,
            logs: RwLock::new(logs),
            persist_lock: Mutex::new(()),
            events,
        };

        if evicted > 0 {
            debug!("Evicted {} expired messages on load", evicted);
            store.persist().await?;
        }
        Ok(store)
    }

    /// Subscribe to append and delete notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    async fn room_log(&self, room_id: &str) -> Option<RoomLog> {
        self.logs.read().await.get(room_id).cloned()
    }

    async fn room_log_or_create(&self, room_id: &str) -> RoomLog {
        if let Some(log) = self.room_log(room_id).await {
            return log;
        }
        let mut logs = self.logs.write().await;
        logs.entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    /// Write a snapshot of every log.
    ///
    /// Snapshots are taken under `persist_lock`, so the last write always
    /// carries the newest state.
    async fn persist(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;

        let rooms: Vec<(String, RoomLog)> = self
            .logs
            .read()
            .await
            .iter()
            .map(|(id, log)| (id.clone(), log.clone()))
            .collect();

        let mut snapshot = BTreeMap::new();
        for (room_id, log) in rooms {
            snapshot.insert(room_id, log.lock().await.clone());
        }

        self.db.kv().put_json(keys::MESSAGES, &snapshot).await?;
        debug!("Persisted message logs for {} rooms", snapshot.len());
        Ok(())
    }

    /// Append a message to the tail of a room's log, then evict.
    ///
    /// A `created_at` earlier than the current tail is raised to the tail's,
    /// keeping each log ordered by time. Returns the log length after eviction.
    pub async fn append(&self, room_id: &str, mut message: Message) -> Result<usize> {
        let log = self.room_log_or_create(room_id).await;
        let len = {
            let mut log = log.lock().await;
            if let Some(last) = log.last() {
                if message.created_at < last.created_at {
                    message.created_at = last.created_at;
                }
            }
            log.push(message.clone());
            let evicted = evict(&mut log, self.clock.now(), self.retention);
            if evicted > 0 {
                debug!(room_id = %room_id, "Evicted {} expired messages", evicted);
            }
            log.len()
        };

        if let Err(e) = self.persist().await {
            log.lock().await.retain(|m| m.id != message.id);
            return Err(e);
        }
        let _ = self.events.send(StoreEvent::Appended {
            room_id: room_id.to_string(),
            message,
        });
        Ok(len)
    }

    /// Create a room's log with `first` as its only message.
    ///
    /// Returns false, leaving everything untouched, if the room already has
    /// a log.
    pub async fn start_log(&self, room_id: &str, first: Message) -> Result<bool> {
        {
            let mut logs = self.logs.write().await;
            if logs.contains_key(room_id) {
                return Ok(false);
            }
            logs.insert(
                room_id.to_string(),
                Arc::new(Mutex::new(vec![first.clone()])),
            );
        }

        if let Err(e) = self.persist().await {
            self.logs.write().await.remove(room_id);
            return Err(e);
        }
        let _ = self.events.send(StoreEvent::Appended {
            room_id: room_id.to_string(),
            message: first,
        });
        Ok(true)
    }

    /// Messages of a room, oldest first. Unknown rooms read as empty.
    pub async fn read(&self, room_id: &str) -> Vec<Message> {
        let Some(log) = self.room_log(room_id).await else {
            return Vec::new();
        };
        let mut log = log.lock().await;
        evict(&mut log, self.clock.now(), self.retention);
        log.clone()
    }

    /// Up to `limit` messages ending at `message_id`, oldest first.
    ///
    /// If `message_id` is not in the log, the window ends at the tail.
    pub async fn history_until(&self, room_id: &str, message_id: &str, limit: usize) -> Vec<Message> {
        let mut messages = self.read(room_id).await;
        if let Some(index) = messages.iter().position(|m| m.id == message_id) {
            messages.truncate(index + 1);
        }
        let skip = messages.len().saturating_sub(limit);
        messages.drain(..skip);
        messages
    }

    /// Whether a log exists for the room, even an empty one.
    pub async fn contains_room(&self, room_id: &str) -> bool {
        self.logs.read().await.contains_key(room_id)
    }

    /// Remove a message. Returns false if it was not there.
    pub async fn delete(&self, room_id: &str, message_id: &str) -> Result<bool> {
        let Some(log) = self.room_log(room_id).await else {
            return Ok(false);
        };
        let removed = {
            let mut log = log.lock().await;
            log.iter()
                .position(|m| m.id == message_id)
                .map(|index| (index, log.remove(index)))
        };
        let Some((index, message)) = removed else {
            return Ok(false);
        };

        if let Err(e) = self.persist().await {
            let mut log = log.lock().await;
            let index = index.min(log.len());
            log.insert(index, message);
            return Err(e);
        }
        let _ = self.events.send(StoreEvent::Deleted {
            room_id: room_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(true)
    }

    /// Find the room currently holding `message_id`.
    ///
    /// Scans every room, evicting as it goes, so an expired message is
    /// never found.
    pub async fn locate(&self, message_id: &str) -> Option<String> {
        let mut rooms: Vec<(String, RoomLog)> = self
            .logs
            .read()
            .await
            .iter()
            .map(|(id, log)| (id.clone(), log.clone()))
            .collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));

        let now = self.clock.now();
        for (room_id, log) in rooms {
            let mut log = log.lock().await;
            evict(&mut log, now, self.retention);
            if log.iter().any(|m| m.id == message_id) {
                return Some(room_id);
            }
        }
        None
    }
}
