use warta_auth::AuthorizedContext;
use warta_core::{DomainError, DomainResult, OutgoingLetterId, Page, PageRequest};

use super::LetterLifecycle;
use crate::outgoing::{NewOutgoingLetter, OutgoingFilter, OutgoingLetter, OutgoingPatch, OutgoingStatus};

impl LetterLifecycle {
    #[tracing::instrument(skip(self, ctx, input), fields(identity_id = %ctx.identity_id), err)]
    pub async fn create_outgoing(
        &self,
        ctx: &AuthorizedContext,
        input: NewOutgoingLetter,
    ) -> DomainResult<OutgoingLetter> {
        let letter = input.into_letter(ctx.identity_id, self.now())?;
        self.stores.outgoing.insert(&letter).await?;
        tracing::info!(letter_id = %letter.id, status = %letter.status, "outgoing letter created");
        Ok(letter)
    }

    pub async fn get_outgoing(&self, id: OutgoingLetterId) -> DomainResult<OutgoingLetter> {
        self.stores
            .outgoing
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("outgoing letter"))
    }

    pub async fn list_outgoing(
        &self,
        filter: &OutgoingFilter,
        page: PageRequest,
    ) -> DomainResult<Page<OutgoingLetter>> {
        Ok(self.stores.outgoing.list(filter, page).await?)
    }

    /// `draft -> pending`, by the creator only.
    #[tracing::instrument(skip(self, ctx), fields(identity_id = %ctx.identity_id), err)]
    pub async fn submit_outgoing(
        &self,
        ctx: &AuthorizedContext,
        id: OutgoingLetterId,
    ) -> DomainResult<OutgoingLetter> {
        let mut letter = self.get_outgoing(id).await?;
        if !letter.is_created_by(ctx.identity_id) {
            return Err(DomainError::forbidden("only the creator can submit this letter"));
        }
        if letter.status != OutgoingStatus::Draft {
            return Err(DomainError::conflict(format!(
                "cannot submit a letter that is {}",
                letter.status
            )));
        }
        letter.status = OutgoingStatus::Pending;
        letter.updated_at = self.now();
        self.write_outgoing(&letter, &[OutgoingStatus::Draft]).await?;
        tracing::info!(letter_id = %id, "outgoing letter submitted");
        Ok(letter)
    }

    /// `pending -> approved`, by an approver.
    #[tracing::instrument(skip(self, ctx, note), fields(identity_id = %ctx.identity_id), err)]
    pub async fn approve_outgoing(
        &self,
        ctx: &AuthorizedContext,
        id: OutgoingLetterId,
        note: Option<String>,
    ) -> DomainResult<OutgoingLetter> {
        self.decide(ctx, id, OutgoingStatus::Approved, crate::text::optional(note))
            .await
    }

    /// `pending -> rejected`, by an approver. A reason is required.
    #[tracing::instrument(skip(self, ctx, note), fields(identity_id = %ctx.identity_id), err)]
    pub async fn reject_outgoing(
        &self,
        ctx: &AuthorizedContext,
        id: OutgoingLetterId,
        note: String,
    ) -> DomainResult<OutgoingLetter> {
        let note = crate::text::required("note", &note, None)?;
        self.decide(ctx, id, OutgoingStatus::Rejected, Some(note)).await
    }

    async fn decide(
        &self,
        ctx: &AuthorizedContext,
        id: OutgoingLetterId,
        outcome: OutgoingStatus,
        note: Option<String>,
    ) -> DomainResult<OutgoingLetter> {
        let mut letter = self.get_outgoing(id).await?;
        if !letter.awaits_decision() {
            return Err(DomainError::conflict(format!(
                "only pending letters can be {outcome}; this one is {}",
                letter.status
            )));
        }
        if !self.holds_any(ctx, &self.policy.approvers).await? {
            tracing::debug!(identity_id = %ctx.identity_id, "approval denied");
            return Err(DomainError::forbidden(format!(
                "requires {}",
                self.policy.approvers
            )));
        }
        letter.decide(ctx.identity_id, outcome, note, self.now());
        self.write_outgoing(&letter, &[OutgoingStatus::Pending]).await?;
        tracing::info!(letter_id = %id, status = %outcome, "outgoing letter decided");
        Ok(letter)
    }

    /// Content edit. Creators edit while `draft`/`rejected`; admins always.
    #[tracing::instrument(skip(self, ctx, patch), fields(identity_id = %ctx.identity_id), err)]
    pub async fn edit_outgoing(
        &self,
        ctx: &AuthorizedContext,
        id: OutgoingLetterId,
        patch: OutgoingPatch,
    ) -> DomainResult<OutgoingLetter> {
        let mut letter = self.get_outgoing(id).await?;
        let is_admin = self.is_admin(ctx).await?;
        if !letter.is_created_by(ctx.identity_id) && !is_admin {
            return Err(DomainError::forbidden("only the creator can edit this letter"));
        }
        if !is_admin && !letter.status.is_editable() {
            return Err(DomainError::conflict(format!(
                "a letter that is {} cannot be edited",
                letter.status
            )));
        }

        let observed = letter.status;
        let replaced = patch.apply(&mut letter, self.now())?;
        self.write_outgoing(&letter, &[observed]).await?;
        self.discard_attachment(replaced).await;
        tracing::info!(letter_id = %id, status = %letter.status, "outgoing letter edited");
        Ok(letter)
    }

    #[tracing::instrument(skip(self, ctx), fields(identity_id = %ctx.identity_id), err)]
    pub async fn delete_outgoing(&self, ctx: &AuthorizedContext, id: OutgoingLetterId) -> DomainResult<()> {
        let letter = self.get_outgoing(id).await?;
        if !letter.is_created_by(ctx.identity_id) && !self.is_admin(ctx).await? {
            return Err(DomainError::forbidden("only the creator can delete this letter"));
        }
        if !self.stores.outgoing.delete(id).await? {
            return Err(DomainError::not_found("outgoing letter"));
        }
        self.discard_attachment(letter.attachment).await;
        tracing::info!(letter_id = %id, "outgoing letter deleted");
        Ok(())
    }

    async fn write_outgoing(
        &self,
        letter: &OutgoingLetter,
        expected: &[OutgoingStatus],
    ) -> DomainResult<()> {
        if self.stores.outgoing.update_if(letter, expected).await? {
            Ok(())
        } else {
            Err(DomainError::conflict(
                "outgoing letter changed concurrently; reload and retry",
            ))
        }
    }
}
