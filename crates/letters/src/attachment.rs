use async_trait::async_trait;

use warta_core::StoreResult;

/// Blob store holding letter attachments.
///
/// Letters only record the opaque path; content is never read here.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Remove a blob that no letter references any more.
    async fn discard(&self, path: &str) -> StoreResult<()>;
}
