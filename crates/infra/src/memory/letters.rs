use std::cmp::Ordering;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use warta_core::{
    DispositionId, IdentityId, IncomingLetterId, OutgoingLetterId, Page, PageRequest, StoreError,
    StoreResult,
};
use warta_letters::{
    Disposition, DispositionRepository, DispositionStatus, IncomingFilter, IncomingLetter,
    IncomingLetterRepository, IncomingStatus, OpenOutcome, OutgoingFilter, OutgoingLetter,
    OutgoingLetterRepository, OutgoingStatus,
};

use super::{EntityTable, read, write};

#[derive(Debug, Default)]
struct LetterTables {
    outgoing: EntityTable<OutgoingLetter>,
    incoming: EntityTable<IncomingLetter>,
    dispositions: EntityTable<Disposition>,
}

/// Outgoing letters, incoming letters and dispositions in process memory.
///
/// All three tables share one lock so that opening a disposition and moving
/// its letter to `processed` is a single step.
#[derive(Debug, Default)]
pub struct InMemoryLetterStore {
    inner: RwLock<LetterTables>,
}

impl InMemoryLetterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(
    a: (&DateTime<Utc>, &uuid::Uuid),
    b: (&DateTime<Utc>, &uuid::Uuid),
) -> Ordering {
    b.0.cmp(a.0).then_with(|| b.1.cmp(a.1))
}

fn outgoing_order(a: &OutgoingLetter, b: &OutgoingLetter) -> Ordering {
    newest_first((&a.created_at, a.id.as_uuid()), (&b.created_at, b.id.as_uuid()))
}

fn incoming_order(a: &IncomingLetter, b: &IncomingLetter) -> Ordering {
    newest_first((&a.created_at, a.id.as_uuid()), (&b.created_at, b.id.as_uuid()))
}

fn disposition_order(a: &Disposition, b: &Disposition) -> Ordering {
    newest_first((&a.created_at, a.id.as_uuid()), (&b.created_at, b.id.as_uuid()))
}

fn duplicate_number(number: &str) -> StoreError {
    StoreError::Conflict(format!("letter number '{number}' already exists"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Outgoing
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OutgoingLetterRepository for InMemoryLetterStore {
    async fn insert(&self, letter: &OutgoingLetter) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        if tables.outgoing.any(|l| l.number == letter.number) {
            return Err(duplicate_number(&letter.number));
        }
        tables.outgoing.insert(letter.clone());
        Ok(())
    }

    async fn find(&self, id: OutgoingLetterId) -> StoreResult<Option<OutgoingLetter>> {
        Ok(read(&self.inner)?.outgoing.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &OutgoingFilter,
        page: PageRequest,
    ) -> StoreResult<Page<OutgoingLetter>> {
        let tables = read(&self.inner)?;
        let rows = tables.outgoing.select(|l| filter.matches(l), outgoing_order);
        Ok(Page::from_sorted(rows, page))
    }

    async fn update_if(
        &self,
        letter: &OutgoingLetter,
        expected: &[OutgoingStatus],
    ) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        if tables
            .outgoing
            .any(|l| l.id != letter.id && l.number == letter.number)
        {
            return Err(duplicate_number(&letter.number));
        }
        Ok(tables
            .outgoing
            .replace_if(letter, |stored| expected.contains(&stored.status)))
    }

    async fn delete(&self, id: OutgoingLetterId) -> StoreResult<bool> {
        Ok(write(&self.inner)?.outgoing.remove(id).is_some())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Incoming
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl IncomingLetterRepository for InMemoryLetterStore {
    async fn insert(&self, letter: &IncomingLetter) -> StoreResult<()> {
        let mut tables = write(&self.inner)?;
        if tables.incoming.any(|l| l.number == letter.number) {
            return Err(duplicate_number(&letter.number));
        }
        tables.incoming.insert(letter.clone());
        Ok(())
    }

    async fn find(&self, id: IncomingLetterId) -> StoreResult<Option<IncomingLetter>> {
        Ok(read(&self.inner)?.incoming.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &IncomingFilter,
        page: PageRequest,
    ) -> StoreResult<Page<IncomingLetter>> {
        let tables = read(&self.inner)?;
        let rows = tables.incoming.select(|l| filter.matches(l), incoming_order);
        Ok(Page::from_sorted(rows, page))
    }

    async fn update_if(
        &self,
        letter: &IncomingLetter,
        expected: &[IncomingStatus],
    ) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        if tables
            .incoming
            .any(|l| l.id != letter.id && l.number == letter.number)
        {
            return Err(duplicate_number(&letter.number));
        }
        Ok(tables
            .incoming
            .replace_if(letter, |stored| expected.contains(&stored.status)))
    }

    async fn complete_if_settled(&self, id: IncomingLetterId, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        let LetterTables {
            incoming,
            dispositions,
            ..
        } = &mut *tables;

        let mut siblings = false;
        let mut settled = true;
        for d in dispositions.values().filter(|d| d.letter_id == id) {
            siblings = true;
            settled &= d.status.is_completed();
        }
        if !siblings || !settled {
            return Ok(false);
        }
        match incoming.get_mut(id) {
            Some(letter) if !letter.status.is_terminal() => {
                letter.status = IncomingStatus::Completed;
                letter.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: IncomingLetterId) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        if tables.incoming.remove(id).is_none() {
            return Ok(false);
        }
        tables.dispositions.retain(|d| d.letter_id != id);
        Ok(true)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispositions
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DispositionRepository for InMemoryLetterStore {
    async fn open(&self, disposition: &Disposition) -> StoreResult<OpenOutcome> {
        let mut tables = write(&self.inner)?;
        let LetterTables {
            incoming,
            dispositions,
            ..
        } = &mut *tables;

        let Some(letter) = incoming.get_mut(disposition.letter_id) else {
            return Ok(OpenOutcome::LetterMissing);
        };
        if !letter.can_be_dispositioned() {
            return Ok(OpenOutcome::LetterClosed);
        }
        if dispositions.any(|d| {
            d.letter_id == disposition.letter_id
                && d.from_identity == disposition.from_identity
                && d.to_identity == disposition.to_identity
        }) {
            return Err(StoreError::Conflict(
                "disposition for this letter, sender and recipient already exists".into(),
            ));
        }

        dispositions.insert(disposition.clone());
        letter.status = IncomingStatus::Processed;
        letter.updated_at = disposition.created_at;
        Ok(OpenOutcome::Opened)
    }

    async fn find(&self, id: DispositionId) -> StoreResult<Option<Disposition>> {
        Ok(read(&self.inner)?.dispositions.get(id).cloned())
    }

    async fn for_letter(&self, letter: IncomingLetterId) -> StoreResult<Vec<Disposition>> {
        let tables = read(&self.inner)?;
        Ok(tables
            .dispositions
            .select(|d| d.letter_id == letter, |a, b| disposition_order(b, a)))
    }

    async fn received_by(
        &self,
        identity: IdentityId,
        status: Option<DispositionStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Disposition>> {
        let tables = read(&self.inner)?;
        let rows = tables.dispositions.select(
            |d| d.to_identity == identity && status.is_none_or(|s| s == d.status),
            disposition_order,
        );
        Ok(Page::from_sorted(rows, page))
    }

    async fn sent_by(&self, identity: IdentityId, page: PageRequest) -> StoreResult<Page<Disposition>> {
        let tables = read(&self.inner)?;
        let rows = tables
            .dispositions
            .select(|d| d.from_identity == identity, disposition_order);
        Ok(Page::from_sorted(rows, page))
    }

    async fn update_if(
        &self,
        disposition: &Disposition,
        expected: &[DispositionStatus],
    ) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        match tables.dispositions.get_mut(disposition.id) {
            Some(stored) if expected.contains(&stored.status) => {
                stored.status = disposition.status;
                stored.note = disposition.note.clone();
                stored.read_at = disposition.read_at;
                stored.completed_at = disposition.completed_at;
                stored.updated_at = disposition.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_if(
        &self,
        id: DispositionId,
        expected: &[DispositionStatus],
    ) -> StoreResult<bool> {
        let mut tables = write(&self.inner)?;
        let open = tables
            .dispositions
            .get(id)
            .is_some_and(|stored| expected.contains(&stored.status));
        if open {
            tables.dispositions.remove(id);
        }
        Ok(open)
    }
}
