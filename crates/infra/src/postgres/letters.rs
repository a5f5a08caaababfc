use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use tracing::instrument;

use warta_core::{
    DispositionId, IdentityId, IncomingLetterId, OutgoingLetterId, Page, PageRequest, StoreResult,
};
use warta_letters::{
    Disposition, DispositionRepository, DispositionStatus, IncomingFilter, IncomingLetter,
    IncomingLetterRepository, IncomingStatus, OpenOutcome, OutgoingFilter, OutgoingLetter,
    OutgoingLetterRepository, OutgoingStatus, Priority,
};

use super::{PgStore, contains_pattern, decode_text, map_sqlx_error, to_i64};

const OUTGOING_COLUMNS: &str = "id, number, letter_date, destination, body, attachment, \
     created_by, approved_by, approved_at, status, note, created_at, updated_at";

const INCOMING_COLUMNS: &str = "id, number, letter_date, sender, subject, body, attachment, \
     received_by, status, priority, read_at, note, created_at, updated_at";

const DISPOSITION_COLUMNS: &str = "id, letter_id, from_identity, to_identity, instruction, note, \
     status, read_at, completed_at, created_at, updated_at";

// ─────────────────────────────────────────────────────────────────────────────
// Rows
// ─────────────────────────────────────────────────────────────────────────────

struct OutgoingRow(OutgoingLetter);

impl<'r> FromRow<'r, PgRow> for OutgoingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let approved_by: Option<uuid::Uuid> = row.try_get("approved_by")?;
        Ok(OutgoingRow(OutgoingLetter {
            id: OutgoingLetterId::from_uuid(row.try_get("id")?),
            number: row.try_get("number")?,
            letter_date: row.try_get("letter_date")?,
            destination: row.try_get("destination")?,
            body: row.try_get("body")?,
            attachment: row.try_get("attachment")?,
            created_by: IdentityId::from_uuid(row.try_get("created_by")?),
            approved_by: approved_by.map(IdentityId::from_uuid),
            approved_at: row.try_get("approved_at")?,
            status: decode_text::<OutgoingStatus>("status", &status)?,
            note: row.try_get("note")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

struct IncomingRow(IncomingLetter);

impl<'r> FromRow<'r, PgRow> for IncomingRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let priority: String = row.try_get("priority")?;
        Ok(IncomingRow(IncomingLetter {
            id: IncomingLetterId::from_uuid(row.try_get("id")?),
            number: row.try_get("number")?,
            letter_date: row.try_get("letter_date")?,
            sender: row.try_get("sender")?,
            subject: row.try_get("subject")?,
            body: row.try_get("body")?,
            attachment: row.try_get("attachment")?,
            received_by: IdentityId::from_uuid(row.try_get("received_by")?),
            status: decode_text::<IncomingStatus>("status", &status)?,
            priority: decode_text::<Priority>("priority", &priority)?,
            read_at: row.try_get("read_at")?,
            note: row.try_get("note")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

struct DispositionRow(Disposition);

impl<'r> FromRow<'r, PgRow> for DispositionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(DispositionRow(Disposition {
            id: DispositionId::from_uuid(row.try_get("id")?),
            letter_id: IncomingLetterId::from_uuid(row.try_get("letter_id")?),
            from_identity: IdentityId::from_uuid(row.try_get("from_identity")?),
            to_identity: IdentityId::from_uuid(row.try_get("to_identity")?),
            instruction: row.try_get("instruction")?,
            note: row.try_get("note")?,
            status: decode_text::<DispositionStatus>("status", &status)?,
            read_at: row.try_get("read_at")?,
            completed_at: row.try_get("completed_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }
}

fn status_names<S>(statuses: &[S], name: impl Fn(&S) -> &'static str) -> Vec<String> {
    statuses.iter().map(|s| name(s).to_string()).collect()
}

fn page_of<T>(items: Vec<T>, total: i64, request: PageRequest) -> Page<T> {
    Page {
        items,
        total: u64::try_from(total).unwrap_or(0),
        page: request.page,
        per_page: request.per_page,
    }
}

/// Append `WHERE` clauses shared by the count and page queries.
fn push_outgoing_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &OutgoingFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND letter_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND letter_date <= ").push_bind(to);
    }
    if let Some(needle) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(needle);
        qb.push(" AND (number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR destination ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR body ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_incoming_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &IncomingFilter) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(from) = filter.date_from {
        qb.push(" AND letter_date >= ").push_bind(from);
    }
    if let Some(to) = filter.date_to {
        qb.push(" AND letter_date <= ").push_bind(to);
    }
    if let Some(needle) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(needle);
        qb.push(" AND (number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sender ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR subject ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, request: PageRequest) {
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(to_i64(request.limit()))
        .push(" OFFSET ")
        .push_bind(to_i64(request.offset()));
}

// ─────────────────────────────────────────────────────────────────────────────
// Outgoing
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OutgoingLetterRepository for PgStore {
    #[instrument(skip(self, letter), fields(letter_id = %letter.id), err)]
    async fn insert(&self, letter: &OutgoingLetter) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO outgoing_letters ({OUTGOING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(letter.id.as_uuid())
        .bind(&letter.number)
        .bind(letter.letter_date)
        .bind(&letter.destination)
        .bind(&letter.body)
        .bind(&letter.attachment)
        .bind(letter.created_by.as_uuid())
        .bind(letter.approved_by.map(uuid::Uuid::from))
        .bind(letter.approved_at)
        .bind(letter.status.as_str())
        .bind(&letter.note)
        .bind(letter.created_at)
        .bind(letter.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_outgoing", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find(&self, id: OutgoingLetterId) -> StoreResult<Option<OutgoingLetter>> {
        let row = sqlx::query_as::<_, OutgoingRow>(&format!(
            "SELECT {OUTGOING_COLUMNS} FROM outgoing_letters WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_outgoing", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn list(
        &self,
        filter: &OutgoingFilter,
        page: PageRequest,
    ) -> StoreResult<Page<OutgoingLetter>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM outgoing_letters");
        push_outgoing_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_sqlx_error("count_outgoing", e))?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {OUTGOING_COLUMNS} FROM outgoing_letters"));
        push_outgoing_filter(&mut select, filter);
        push_page(&mut select, page);
        let rows = select
            .build_query_as::<OutgoingRow>()
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_outgoing", e))?;

        Ok(page_of(rows.into_iter().map(|r| r.0).collect(), total, page))
    }

    #[instrument(skip(self, letter), fields(letter_id = %letter.id, status = %letter.status), err)]
    async fn update_if(
        &self,
        letter: &OutgoingLetter,
        expected: &[OutgoingStatus],
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE outgoing_letters
            SET number = $2, letter_date = $3, destination = $4, body = $5, attachment = $6,
                approved_by = $7, approved_at = $8, status = $9, note = $10, updated_at = $11
            WHERE id = $1 AND status = ANY($12)
            "#,
        )
        .bind(letter.id.as_uuid())
        .bind(&letter.number)
        .bind(letter.letter_date)
        .bind(&letter.destination)
        .bind(&letter.body)
        .bind(&letter.attachment)
        .bind(letter.approved_by.map(uuid::Uuid::from))
        .bind(letter.approved_at)
        .bind(letter.status.as_str())
        .bind(&letter.note)
        .bind(letter.updated_at)
        .bind(status_names(expected, OutgoingStatus::as_str))
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_outgoing", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, id: OutgoingLetterId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM outgoing_letters WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_outgoing", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Incoming
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl IncomingLetterRepository for PgStore {
    #[instrument(skip(self, letter), fields(letter_id = %letter.id), err)]
    async fn insert(&self, letter: &IncomingLetter) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO incoming_letters ({INCOMING_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(letter.id.as_uuid())
        .bind(&letter.number)
        .bind(letter.letter_date)
        .bind(&letter.sender)
        .bind(&letter.subject)
        .bind(&letter.body)
        .bind(&letter.attachment)
        .bind(letter.received_by.as_uuid())
        .bind(letter.status.as_str())
        .bind(letter.priority.as_str())
        .bind(letter.read_at)
        .bind(&letter.note)
        .bind(letter.created_at)
        .bind(letter.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_incoming", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find(&self, id: IncomingLetterId) -> StoreResult<Option<IncomingLetter>> {
        let row = sqlx::query_as::<_, IncomingRow>(&format!(
            "SELECT {INCOMING_COLUMNS} FROM incoming_letters WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_incoming", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn list(
        &self,
        filter: &IncomingFilter,
        page: PageRequest,
    ) -> StoreResult<Page<IncomingLetter>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM incoming_letters");
        push_incoming_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_sqlx_error("count_incoming", e))?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {INCOMING_COLUMNS} FROM incoming_letters"));
        push_incoming_filter(&mut select, filter);
        push_page(&mut select, page);
        let rows = select
            .build_query_as::<IncomingRow>()
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_incoming", e))?;

        Ok(page_of(rows.into_iter().map(|r| r.0).collect(), total, page))
    }

    #[instrument(skip(self, letter), fields(letter_id = %letter.id, status = %letter.status), err)]
    async fn update_if(
        &self,
        letter: &IncomingLetter,
        expected: &[IncomingStatus],
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE incoming_letters
            SET number = $2, letter_date = $3, sender = $4, subject = $5, body = $6,
                attachment = $7, status = $8, priority = $9, read_at = $10, note = $11,
                updated_at = $12
            WHERE id = $1 AND status = ANY($13)
            "#,
        )
        .bind(letter.id.as_uuid())
        .bind(&letter.number)
        .bind(letter.letter_date)
        .bind(&letter.sender)
        .bind(&letter.subject)
        .bind(&letter.body)
        .bind(&letter.attachment)
        .bind(letter.status.as_str())
        .bind(letter.priority.as_str())
        .bind(letter.read_at)
        .bind(&letter.note)
        .bind(letter.updated_at)
        .bind(status_names(expected, IncomingStatus::as_str))
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_incoming", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Locks the letter row first, so a concurrent `open` either commits
    /// before the sibling check or waits and then sees `completed`.
    #[instrument(skip(self), err)]
    async fn complete_if_settled(&self, id: IncomingLetterId, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("settle_incoming", e))?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM incoming_letters WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_incoming", e))?;
        let Some(status) = status else {
            return Ok(false);
        };
        let status = decode_text::<IncomingStatus>("status", &status)
            .map_err(|e| map_sqlx_error("lock_incoming", e))?;
        if status.is_terminal() {
            return Ok(false);
        }

        let result = sqlx::query(
            r#"
            UPDATE incoming_letters SET status = $2, updated_at = $3
            WHERE id = $1
              AND EXISTS (SELECT 1 FROM dispositions WHERE letter_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM dispositions WHERE letter_id = $1 AND status <> $4
              )
            "#,
        )
        .bind(id.as_uuid())
        .bind(IncomingStatus::Completed.as_str())
        .bind(at)
        .bind(DispositionStatus::Completed.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("settle_incoming", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("settle_incoming", e))?;
        Ok(result.rows_affected() == 1)
    }

    /// Dispositions go with the letter through `ON DELETE CASCADE`.
    #[instrument(skip(self), err)]
    async fn delete(&self, id: IncomingLetterId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM incoming_letters WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_incoming", e))?;
        Ok(result.rows_affected() > 0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispositions
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DispositionRepository for PgStore {
    /// Locks the letter row, inserts the disposition and marks the letter
    /// `processed` in one transaction.
    #[instrument(
        skip(self, disposition),
        fields(disposition_id = %disposition.id, letter_id = %disposition.letter_id),
        err
    )]
    async fn open(&self, disposition: &Disposition) -> StoreResult<OpenOutcome> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("open_disposition", e))?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM incoming_letters WHERE id = $1 FOR UPDATE")
                .bind(disposition.letter_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_incoming", e))?;
        let Some(status) = status else {
            return Ok(OpenOutcome::LetterMissing);
        };
        let status = decode_text::<IncomingStatus>("status", &status)
            .map_err(|e| map_sqlx_error("lock_incoming", e))?;
        if status.is_terminal() {
            return Ok(OpenOutcome::LetterClosed);
        }

        sqlx::query(&format!(
            "INSERT INTO dispositions ({DISPOSITION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(disposition.id.as_uuid())
        .bind(disposition.letter_id.as_uuid())
        .bind(disposition.from_identity.as_uuid())
        .bind(disposition.to_identity.as_uuid())
        .bind(&disposition.instruction)
        .bind(&disposition.note)
        .bind(disposition.status.as_str())
        .bind(disposition.read_at)
        .bind(disposition.completed_at)
        .bind(disposition.created_at)
        .bind(disposition.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_disposition", e))?;

        sqlx::query("UPDATE incoming_letters SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(disposition.letter_id.as_uuid())
            .bind(IncomingStatus::Processed.as_str())
            .bind(disposition.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("process_incoming", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("open_disposition", e))?;
        Ok(OpenOutcome::Opened)
    }

    #[instrument(skip(self), err)]
    async fn find(&self, id: DispositionId) -> StoreResult<Option<Disposition>> {
        let row = sqlx::query_as::<_, DispositionRow>(&format!(
            "SELECT {DISPOSITION_COLUMNS} FROM dispositions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_disposition", e))?;
        Ok(row.map(|r| r.0))
    }

    #[instrument(skip(self), err)]
    async fn for_letter(&self, letter: IncomingLetterId) -> StoreResult<Vec<Disposition>> {
        let rows = sqlx::query_as::<_, DispositionRow>(&format!(
            "SELECT {DISPOSITION_COLUMNS} FROM dispositions WHERE letter_id = $1 \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(letter.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("letter_dispositions", e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), err)]
    async fn received_by(
        &self,
        identity: IdentityId,
        status: Option<DispositionStatus>,
        page: PageRequest,
    ) -> StoreResult<Page<Disposition>> {
        let status = status.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM dispositions \
             WHERE to_identity = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(identity.as_uuid())
        .bind(status)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("count_received_dispositions", e))?;

        let rows = sqlx::query_as::<_, DispositionRow>(&format!(
            "SELECT {DISPOSITION_COLUMNS} FROM dispositions \
             WHERE to_identity = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(identity.as_uuid())
        .bind(status)
        .bind(to_i64(page.limit()))
        .bind(to_i64(page.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("received_dispositions", e))?;

        Ok(page_of(rows.into_iter().map(|r| r.0).collect(), total, page))
    }

    #[instrument(skip(self), err)]
    async fn sent_by(&self, identity: IdentityId, page: PageRequest) -> StoreResult<Page<Disposition>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM dispositions WHERE from_identity = $1")
            .bind(identity.as_uuid())
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_sqlx_error("count_sent_dispositions", e))?;

        let rows = sqlx::query_as::<_, DispositionRow>(&format!(
            "SELECT {DISPOSITION_COLUMNS} FROM dispositions WHERE from_identity = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(identity.as_uuid())
        .bind(to_i64(page.limit()))
        .bind(to_i64(page.offset()))
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("sent_dispositions", e))?;

        Ok(page_of(rows.into_iter().map(|r| r.0).collect(), total, page))
    }

    #[instrument(skip(self, disposition), fields(disposition_id = %disposition.id, status = %disposition.status), err)]
    async fn update_if(
        &self,
        disposition: &Disposition,
        expected: &[DispositionStatus],
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE dispositions
            SET status = $2, note = $3, read_at = $4, completed_at = $5, updated_at = $6
            WHERE id = $1 AND status = ANY($7)
            "#,
        )
        .bind(disposition.id.as_uuid())
        .bind(disposition.status.as_str())
        .bind(&disposition.note)
        .bind(disposition.read_at)
        .bind(disposition.completed_at)
        .bind(disposition.updated_at)
        .bind(status_names(expected, DispositionStatus::as_str))
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_disposition", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, expected), err)]
    async fn delete_if(
        &self,
        id: DispositionId,
        expected: &[DispositionStatus],
    ) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM dispositions WHERE id = $1 AND status = ANY($2)")
            .bind(id.as_uuid())
            .bind(status_names(expected, DispositionStatus::as_str))
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_disposition", e))?;
        Ok(result.rows_affected() == 1)
    }
}
