//! Test helpers for engine-level tests.
//!
//! Provides a scripted reply generator and an engine wired to a manual clock.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use futures::future::BoxFuture;

use chatzone::{ChatZone, Config, Database, ManualClock, Message, ReplyGenerator};

/// Reply generator that answers from a script and records what it was asked.
#[derive(Default)]
pub struct ScriptedReplies {
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedReplies {
    /// Create a generator that answers with `replies` in order, then "ok".
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// History lines seen by each call, formatted `nickname: text`.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl ReplyGenerator for ScriptedReplies {
    fn generate<'a>(&'a self, history: &'a [Message]) -> BoxFuture<'a, String> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(history.iter().map(Message::format).collect());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "ok".to_string())
        })
    }
}

/// Fixed starting instant for every test.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// Default configuration with an immediate, enabled bot.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.bot.reply_delay_ms = 0;
    config
}

/// An engine with its clock, database and generator.
pub struct TestZone {
    pub zone: ChatZone,
    pub clock: Arc<ManualClock>,
    pub db: Arc<Database>,
    pub replies: Arc<ScriptedReplies>,
}

/// Build an engine on an in-memory database.
pub async fn setup_with(config: Config, replies: ScriptedReplies) -> TestZone {
    let db = Arc::new(Database::open_in_memory().await.unwrap());
    let clock = Arc::new(ManualClock::new(t0()));
    let replies = Arc::new(replies);
    let zone = ChatZone::with_parts(db.clone(), clock.clone(), replies.clone(), &config)
        .await
        .unwrap();
    TestZone {
        zone,
        clock,
        db,
        replies,
    }
}

/// Build an engine with the bot disabled.
pub async fn setup() -> TestZone {
    let mut config = test_config();
    config.bot.enabled = false;
    setup_with(config, ScriptedReplies::default()).await
}
