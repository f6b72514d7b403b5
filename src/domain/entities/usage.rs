use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-sender quota record, created lazily on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuotaRecord {
    pub limit: i64,
}

/// The persisted usage document.
///
/// `users` holds remaining per-sender allowances, `cmd` holds monotonic
/// per-token invocation counts. These are advisory telemetry values, not
/// a system of record, so durable state may lag the in-memory view by up
/// to one flush interval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageData {
    #[serde(default)]
    pub users: HashMap<String, UserQuotaRecord>,
    #[serde(default)]
    pub cmd: HashMap<String, u64>,
}

/// Shared handle to the in-memory usage document.
pub type SharedUsage = Arc<RwLock<UsageData>>;
