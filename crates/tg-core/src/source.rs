//! Directory source abstraction

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::types::DirectorySnapshot;

/// A source of member directory snapshots
///
/// How the directory is obtained is the implementor's concern; the
/// guard only requires that each call produces a complete snapshot or
/// a transient error. Implementations are expected to bound their own
/// I/O with a timeout.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch a fresh snapshot of the member directory
    async fn fetch(&self) -> Result<DirectorySnapshot, DirectoryError>;
}
