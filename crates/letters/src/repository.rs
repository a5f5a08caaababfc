//! Persistence ports for letters and dispositions.
//!
//! Every status change is a compare-and-set: the write only lands when the
//! stored status is still one of `expected`, and the call reports whether it
//! did. Callers turn `false` into a conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warta_core::{
    DispositionId, IdentityId, IncomingLetterId, OutgoingLetterId, Page, PageRequest, StoreResult,
};

use crate::disposition::{Disposition, DispositionStatus};
use crate::incoming::{IncomingFilter, IncomingLetter, IncomingStatus};
use crate::outgoing::{OutgoingFilter, OutgoingLetter, OutgoingStatus};

#[async_trait]
pub trait OutgoingLetterRepository: Send + Sync {
    /// Duplicate letter number is a `StoreError::Conflict`.
    async fn insert(&self, letter: &OutgoingLetter) -> StoreResult<()>;

    async fn find(&self, id: OutgoingLetterId) -> StoreResult<Option<OutgoingLetter>>;

    /// Newest first.
    async fn list(
        &self,
        filter: &OutgoingFilter,
        page: PageRequest,
    ) -> StoreResult<Page<OutgoingLetter>>;

    /// Overwrite the row with `letter` if its stored status is in `expected`.
    async fn update_if(
        &self,
        letter: &OutgoingLetter,
        expected: &[OutgoingStatus],
    ) -> StoreResult<bool>;

    async fn delete(&self, id: OutgoingLetterId) -> StoreResult<bool>;
}

#[async_trait]
pub trait IncomingLetterRepository: Send + Sync {
    async fn insert(&self, letter: &IncomingLetter) -> StoreResult<()>;

    async fn find(&self, id: IncomingLetterId) -> StoreResult<Option<IncomingLetter>>;

    async fn list(
        &self,
        filter: &IncomingFilter,
        page: PageRequest,
    ) -> StoreResult<Page<IncomingLetter>>;

    async fn update_if(
        &self,
        letter: &IncomingLetter,
        expected: &[IncomingStatus],
    ) -> StoreResult<bool>;

    /// Move an open letter to `completed` if it has dispositions and every
    /// one of them is completed.
    ///
    /// The sibling check and the status write are one atomic step, so a
    /// disposition opened concurrently either lands first and blocks the
    /// move or finds the letter already closed.
    async fn complete_if_settled(&self, id: IncomingLetterId, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Deletes the letter and its dispositions.
    async fn delete(&self, id: IncomingLetterId) -> StoreResult<bool>;
}

/// Result of [`DispositionRepository::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    LetterMissing,
    /// The letter is already completed.
    LetterClosed,
}

#[async_trait]
pub trait DispositionRepository: Send + Sync {
    /// Insert `disposition` and move its letter to `processed`, atomically.
    ///
    /// Nothing is written unless the letter exists and is not completed. A
    /// repeated (letter, from, to) triple is a `StoreError::Conflict`.
    async fn open(&self, disposition: &Disposition) -> StoreResult<OpenOutcome>;

    async fn find(&self, id: DispositionId) -> StoreResult<Option<Disposition>>;

    /// Oldest first.
    async fn for_letter(&self, letter: IncomingLetterId) -> StoreResult<Vec<Disposition>>;

    /// Newest first.
    async fn received_by(
        &self,
        identity: IdentityId,
        status: Option<DispositionStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Disposition>>;

    async fn sent_by(&self, identity: IdentityId, page: PageRequest) -> StoreResult<Page<Disposition>>;

    /// Persist status, timestamps and note of `disposition` if the stored
    /// status is in `expected`.
    async fn update_if(
        &self,
        disposition: &Disposition,
        expected: &[DispositionStatus],
    ) -> StoreResult<bool>;

    async fn delete_if(
        &self,
        id: DispositionId,
        expected: &[DispositionStatus],
    ) -> StoreResult<bool>;
}
