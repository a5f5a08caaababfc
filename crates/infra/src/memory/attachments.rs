use std::sync::RwLock;

use async_trait::async_trait;

use warta_core::StoreResult;
use warta_letters::AttachmentStore;

use super::{read, write};

/// Records discarded attachment paths instead of touching a blob store.
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    discarded: RwLock<Vec<String>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths discarded so far, oldest first.
    pub fn discarded(&self) -> StoreResult<Vec<String>> {
        Ok(read(&self.discarded)?.clone())
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn discard(&self, path: &str) -> StoreResult<()> {
        tracing::debug!(path, "attachment discarded");
        write(&self.discarded)?.push(path.to_string());
        Ok(())
    }
}
