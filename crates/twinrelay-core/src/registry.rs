//! In-memory twin registry.

use crate::{Result, TwinError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use twinrelay_types::{ContentSlot, Twin};

/// Insertion-ordered set of twins guarded by a read-write lock.
///
/// Every accessor hands out owned copies; callers never hold a reference
/// into the underlying storage.
#[derive(Debug, Default)]
pub struct TwinRegistry {
    twins: RwLock<Vec<Twin>>,
}

impl TwinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from seed data. Seed entries with a blank or
    /// repeated id are skipped.
    pub fn with_seed(seed: impl IntoIterator<Item = Twin>) -> Self {
        let mut twins: Vec<Twin> = Vec::new();
        for twin in seed {
            if twin.id.is_empty() {
                warn!(target: "twinrelay::registry", "Skipping seed twin with empty id");
                continue;
            }
            if twins.iter().any(|t| t.id == twin.id) {
                warn!(target: "twinrelay::registry", "Skipping duplicate seed twin {}", twin.id);
                continue;
            }
            twins.push(twin);
        }
        info!(target: "twinrelay::registry", "Seeded registry with {} twins", twins.len());
        Self {
            twins: RwLock::new(twins),
        }
    }

    /// All twins in insertion order.
    pub async fn list_all(&self) -> Vec<Twin> {
        self.twins.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.twins.read().await.len()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Twin> {
        self.twins
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| TwinError::NotFound(id.to_string()))
    }

    /// Append a new twin. The id must be non-empty and not yet registered.
    pub async fn create(&self, twin: Twin) -> Result<Twin> {
        if twin.id.is_empty() {
            return Err(TwinError::EmptyId);
        }

        let mut twins = self.twins.write().await;
        if twins.iter().any(|t| t.id == twin.id) {
            return Err(TwinError::DuplicateId(twin.id));
        }
        twins.push(twin.clone());
        info!(target: "twinrelay::registry", "Created twin {}", twin.id);
        Ok(twin)
    }

    /// Set one content pointer slot from its wire tag (`N` or `H`).
    ///
    /// The twin is resolved before the tag is checked; an invalid tag
    /// leaves the record untouched.
    pub async fn update_content_pointer(&self, id: &str, tag: &str, value: &str) -> Result<Twin> {
        let twin = self
            .modify(id, |twin| {
                let slot: ContentSlot = tag.parse()?;
                twin.set_content_pointer(slot, value);
                Ok(())
            })
            .await?;
        debug!(target: "twinrelay::registry", "Twin {} slot {} set to {}", id, tag, value);
        Ok(twin)
    }

    pub async fn update_wallet(&self, id: &str, value: &str) -> Result<Twin> {
        let twin = self
            .modify(id, |twin| {
                twin.wallet_address = value.to_string();
                Ok(())
            })
            .await?;
        debug!(target: "twinrelay::registry", "Twin {} wallet updated", id);
        Ok(twin)
    }

    /// Apply `f` to the twin with `id` under the write lock. `f` must not
    /// touch the record before it can fail.
    async fn modify(&self, id: &str, f: impl FnOnce(&mut Twin) -> Result<()>) -> Result<Twin> {
        let mut twins = self.twins.write().await;
        let twin = twins
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TwinError::NotFound(id.to_string()))?;
        f(twin)?;
        Ok(twin.clone())
    }
}
