//! Time-boxed bans keyed by normalized nickname.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::identity::normalize_nickname;
use crate::clock::Clock;
use crate::db::{keys, Database};
use crate::{ChatzoneError, Result};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Ban durations offered to moderators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanDuration {
    /// 15 minutes.
    FifteenMinutes,
    /// 30 minutes.
    ThirtyMinutes,
    /// 12 hours.
    TwelveHours,
}

impl BanDuration {
    /// All presets, shortest first.
    pub const PRESETS: [BanDuration; 3] = [
        BanDuration::FifteenMinutes,
        BanDuration::ThirtyMinutes,
        BanDuration::TwelveHours,
    ];

    /// Length in minutes.
    pub fn minutes(&self) -> u32 {
        match self {
            BanDuration::FifteenMinutes => 15,
            BanDuration::ThirtyMinutes => 30,
            BanDuration::TwelveHours => 12 * 60,
        }
    }
}

/// An active ban.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanRecord {
    /// Normalized nickname.
    pub nickname: String,
    /// Expiry in epoch milliseconds.
    pub expiry: i64,
}

/// Ban list persisted under [`keys::BANS`].
///
/// A record with `now >= expiry` is treated as absent and dropped whenever
/// it is seen: on load, on lookup, on listing.
pub struct BanList {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    bans: Mutex<HashMap<String, i64>>,
}

impl BanList {
    /// Load the ban list, purging expired records.
    pub async fn load(db: Arc<Database>, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut bans: HashMap<String, i64> = db.kv().get_json(keys::BANS).await?.unwrap_or_default();

        let now = clock.now_millis();
        let before = bans.len();
        bans.retain(|_, expiry| now < *expiry);
        let purged = before - bans.len();
        if purged > 0 {
            debug!("Purged {} expired bans on load", purged);
            db.kv().put_json(keys::BANS, &bans).await?;
        }

        Ok(Self {
            db,
            clock,
            bans: Mutex::new(bans),
        })
    }

    async fn persist(&self, bans: &HashMap<String, i64>) -> Result<()> {
        self.db.kv().put_json(keys::BANS, bans).await
    }

    /// Ban `nickname` for `duration_minutes` from now.
    ///
    /// Overwrites any existing ban for the nickname; durations never add up.
    /// Returns the expiry in epoch milliseconds.
    pub async fn ban(&self, nickname: &str, duration_minutes: u32) -> Result<i64> {
        if duration_minutes == 0 {
            return Err(ChatzoneError::Validation(
                "ban duration must be at least one minute".to_string(),
            ));
        }
        let key = normalize_nickname(nickname);
        if key.is_empty() {
            return Err(ChatzoneError::Validation("nickname is required".to_string()));
        }

        let expiry = self.clock.now_millis() + i64::from(duration_minutes) * MILLIS_PER_MINUTE;

        let mut bans = self.bans.lock().await;
        let mut next = bans.clone();
        next.insert(key.clone(), expiry);
        self.persist(&next).await?;
        *bans = next;

        info!(nickname = %key, expiry, "Nickname banned for {} minutes", duration_minutes);
        Ok(expiry)
    }

    /// Lift a ban. Returns true if a record was removed.
    pub async fn unban(&self, nickname: &str) -> Result<bool> {
        let key = normalize_nickname(nickname);
        let mut bans = self.bans.lock().await;
        if !bans.contains_key(&key) {
            return Ok(false);
        }
        let mut next = bans.clone();
        next.remove(&key);
        self.persist(&next).await?;
        *bans = next;

        info!(nickname = %key, "Ban lifted");
        Ok(true)
    }

    /// Expiry of the active ban on `nickname`, if any.
    pub async fn active_ban(&self, nickname: &str) -> Option<i64> {
        let key = normalize_nickname(nickname);
        let now = self.clock.now_millis();

        let mut bans = self.bans.lock().await;
        match bans.get(&key).copied() {
            Some(expiry) if now < expiry => Some(expiry),
            Some(_) => {
                // Expired: drop in memory, the next mutation persists the removal
                bans.remove(&key);
                None
            }
            None => None,
        }
    }

    /// All active bans sorted by nickname.
    pub async fn list(&self) -> Vec<BanRecord> {
        let now = self.clock.now_millis();
        let mut bans = self.bans.lock().await;
        bans.retain(|_, expiry| now < *expiry);

        let mut records: Vec<BanRecord> = bans
            .iter()
            .map(|(nickname, expiry)| BanRecord {
                nickname: nickname.clone(),
                expiry: *expiry,
            })
            .collect();
        records.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    async fn setup() -> (Arc<Database>, Arc<ManualClock>, BanList) {
        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        let bans = BanList::load(db.clone(), clock.clone()).await.unwrap();
        (db, clock, bans)
    }

    #[test]
    fn test_presets() {
        let minutes: Vec<u32> = BanDuration::PRESETS.iter().map(|d| d.minutes()).collect();
        assert_eq!(minutes, vec![15, 30, 720]);
    }

    #[tokio::test]
    async fn test_ban_and_expire() {
        let (_db, clock, bans) = setup().await;
        let t0 = clock.now_millis();

        let expiry = bans.ban("Eve", 15).await.unwrap();
        assert_eq!(expiry, t0 + 15 * 60_000);

        clock.advance(Duration::minutes(5));
        assert_eq!(bans.active_ban("eve").await, Some(expiry));
        assert_eq!(bans.active_ban("EVE").await, Some(expiry));

        clock.advance(Duration::minutes(10));
        // now == expiry counts as expired
        assert_eq!(bans.active_ban("eve").await, None);
        assert!(bans.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_ban_overwrites() {
        let (_db, clock, bans) = setup().await;
        let t0 = clock.now_millis();

        bans.ban("eve", 720).await.unwrap();
        let expiry = bans.ban("eve", 15).await.unwrap();

        assert_eq!(expiry, t0 + 15 * 60_000);
        assert_eq!(bans.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_duration_rejected() {
        let (_db, _clock, bans) = setup().await;
        assert!(matches!(
            bans.ban("eve", 0).await,
            Err(ChatzoneError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unban_idempotent() {
        let (_db, _clock, bans) = setup().await;
        bans.ban("eve", 30).await.unwrap();

        assert!(bans.unban("EVE").await.unwrap());
        assert!(!bans.unban("eve").await.unwrap());
        assert_eq!(bans.active_ban("eve").await, None);
    }

    #[tokio::test]
    async fn test_persisted_and_purged_on_load() {
        let (db, clock, bans) = setup().await;
        bans.ban("eve", 15).await.unwrap();
        bans.ban("mallory", 720).await.unwrap();

        clock.advance(Duration::minutes(20));
        let reloaded = BanList::load(db.clone(), clock.clone()).await.unwrap();

        let records = reloaded.list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nickname, "mallory");

        let stored: HashMap<String, i64> = db.kv().get_json(keys::BANS).await.unwrap().unwrap();
        assert!(!stored.contains_key("eve"));
    }

    #[tokio::test]
    async fn test_failed_write_changes_nothing() {
        let (db, _clock, bans) = setup().await;
        let expiry = bans.ban("eve", 30).await.unwrap();

        sqlx::query("DROP TABLE kv_store")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(bans.ban("mallory", 15).await.is_err());
        assert_eq!(bans.active_ban("mallory").await, None);

        assert!(bans.unban("eve").await.is_err());
        assert_eq!(bans.active_ban("eve").await, Some(expiry));
    }
}
