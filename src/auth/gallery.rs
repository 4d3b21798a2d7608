//! Profile picture gallery managed by the administrator.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::identity::DEFAULT_PROFILE_PICTURE;
use crate::db::{keys, Database};
use crate::{ChatzoneError, Result};

/// Gallery persisted under [`keys::GALLERY`].
///
/// The built-in default picture is always listed first and never stored.
pub struct Gallery {
    db: Arc<Database>,
    pictures: RwLock<Vec<String>>,
}

impl Gallery {
    /// Load the gallery.
    pub async fn load(db: Arc<Database>) -> Result<Self> {
        let mut pictures: Vec<String> =
            db.kv().get_json(keys::GALLERY).await?.unwrap_or_default();
        pictures.retain(|p| p != DEFAULT_PROFILE_PICTURE);
        Ok(Self {
            db,
            pictures: RwLock::new(pictures),
        })
    }

    /// All pictures, default first.
    pub async fn list(&self) -> Vec<String> {
        let pictures = self.pictures.read().await;
        std::iter::once(DEFAULT_PROFILE_PICTURE.to_string())
            .chain(pictures.iter().cloned())
            .collect()
    }

    /// Add a picture. Returns false if it is already listed.
    pub async fn add(&self, url: &str) -> Result<bool> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ChatzoneError::Validation("picture URL is required".to_string()));
        }
        if url == DEFAULT_PROFILE_PICTURE {
            return Ok(false);
        }

        let mut pictures = self.pictures.write().await;
        if pictures.iter().any(|p| p == url) {
            return Ok(false);
        }
        let mut next = pictures.clone();
        next.push(url.to_string());
        self.db.kv().put_json(keys::GALLERY, &next).await?;
        *pictures = next;

        info!(url = %url, "Picture added to gallery");
        Ok(true)
    }

    /// Remove a picture. The default picture cannot be removed.
    pub async fn remove(&self, url: &str) -> Result<bool> {
        let mut pictures = self.pictures.write().await;
        let next: Vec<String> = pictures.iter().filter(|p| *p != url).cloned().collect();
        if next.len() == pictures.len() {
            return Ok(false);
        }
        self.db.kv().put_json(keys::GALLERY, &next).await?;
        *pictures = next;

        info!(url = %url, "Picture removed from gallery");
        Ok(true)
    }
}
