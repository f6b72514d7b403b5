use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::UsageData;

/// Persistence trait - the durable key-value document collaborator.
///
/// The usage store reads the whole document once at startup and writes it
/// back on a fixed flush interval; persistence is best-effort.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the stored document, `None` when nothing has been written yet.
    async fn read(&self) -> Result<Option<UsageData>, StorageError>;

    /// Write the whole document.
    async fn write(&self, data: &UsageData) -> Result<(), StorageError>;
}
