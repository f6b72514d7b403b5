//! Usage storage - In-memory quota/counter view with best-effort JSON persistence

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{SharedUsage, UsageData, UserQuotaRecord};
use crate::domain::traits::Persistence;

/// JSON file-backed persistence for the usage document.
///
/// The whole document is written on each flush. A missing or corrupt file
/// degrades to the default document with an error log; it never aborts
/// the host.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Persistence for JsonFileStore {
    async fn read(&self) -> Result<Option<UsageData>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn write(&self, data: &UsageData) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let raw = serde_json::to_string_pretty(data)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

/// In-memory view of per-sender quotas and per-token invocation counters.
///
/// Mutations are applied synchronously in-process; durable state is
/// written back on a fixed interval, so it may lag by up to one flush.
pub struct UsageStore {
    data: SharedUsage,
    persistence: Arc<dyn Persistence>,
    default_allowance: i64,
}

impl UsageStore {
    pub fn new(persistence: Arc<dyn Persistence>, default_allowance: i64) -> Self {
        Self {
            data: Arc::new(RwLock::new(UsageData::default())),
            persistence,
            default_allowance,
        }
    }

    /// Load the durable document into memory. A failed or empty read
    /// leaves the default document in place.
    pub async fn load(&self) -> Result<(), StorageError> {
        match self.persistence.read().await {
            Ok(Some(stored)) => {
                *self.data.write().await = stored;
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                tracing::error!(%e, "failed to load usage data, starting fresh");
                Err(e)
            }
        }
    }

    /// Handle to the shared in-memory document, as passed to handlers.
    pub fn shared(&self) -> SharedUsage {
        Arc::clone(&self.data)
    }

    /// Remaining allowance for a sender; the quota record is created
    /// lazily with the default allowance on first use.
    pub async fn remaining_limit(&self, sender_id: &str) -> i64 {
        let mut data = self.data.write().await;
        data.users
            .entry(sender_id.to_string())
            .or_insert(UserQuotaRecord {
                limit: self.default_allowance,
            })
            .limit
    }

    /// Consume one unit of the sender's allowance. No floor is enforced;
    /// the value may go negative (see DESIGN.md).
    pub async fn consume_quota(&self, sender_id: &str) -> i64 {
        let mut data = self.data.write().await;
        let record = data
            .users
            .entry(sender_id.to_string())
            .or_insert(UserQuotaRecord {
                limit: self.default_allowance,
            });
        record.limit -= 1;
        record.limit
    }

    /// Record one invocation of a token. Counters only ever go up.
    pub async fn record_hit(&self, token: &str) -> u64 {
        let mut data = self.data.write().await;
        let count = data.cmd.entry(token.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub async fn hit_count(&self, token: &str) -> u64 {
        self.data.read().await.cmd.get(token).copied().unwrap_or(0)
    }

    /// Write the current in-memory document through to persistence.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let snapshot = self.data.read().await.clone();
        self.persistence.write(&snapshot).await
    }

    /// Spawn the fixed-interval flush task. Flush failures are logged and
    /// the task keeps running; persistence is best-effort.
    pub fn spawn_flush_task(self: Arc<Self>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
        let store = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                if let Err(e) = store.flush().await {
                    tracing::warn!(%e, "usage flush failed");
                }
            }
        })
    }
}
