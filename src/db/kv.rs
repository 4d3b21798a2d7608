//! Key-value repository over the `kv_store` table.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::Result;

/// Keys of the durable documents.
pub mod keys {
    /// Provisioned moderators (list).
    pub const MODERATORS: &str = "chatzone-moderators";
    /// Admin credential hash (string).
    pub const ADMIN_CREDENTIAL: &str = "chatzone-admin-password";
    /// Profile picture gallery (list, default picture excluded).
    pub const GALLERY: &str = "chatzone-gallery";
    /// Ban map: lower-cased nickname to expiry in epoch millis.
    pub const BANS: &str = "chatzone-banned-users";
    /// Message logs: room id to ordered messages.
    pub const MESSAGES: &str = "chatzone-messages";
    /// Report list in creation order.
    pub const REPORTS: &str = "chatzone-reports";
}

/// Repository for JSON documents stored by key.
pub struct KvRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> KvRepository<'a> {
    /// Create a new repository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the raw JSON stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// Store raw JSON under `key`, replacing any previous value.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES ($1, $2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove `key`. Returns true if a value was removed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get and deserialize the document stored under `key`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a document under `key`.
    pub async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.put(key, &raw).await
    }
}
