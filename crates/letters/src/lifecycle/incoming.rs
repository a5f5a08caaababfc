use warta_auth::AuthorizedContext;
use warta_core::{DomainError, DomainResult, IncomingLetterId, Page, PageRequest};

use super::{IncomingDetail, LetterLifecycle};
use crate::incoming::{IncomingFilter, IncomingLetter, IncomingPatch, IncomingStatus, NewIncomingLetter};

impl LetterLifecycle {
    /// Register an arriving letter; the caller becomes its receiver.
    #[tracing::instrument(skip(self, ctx, input), fields(identity_id = %ctx.identity_id), err)]
    pub async fn register_incoming(
        &self,
        ctx: &AuthorizedContext,
        input: NewIncomingLetter,
    ) -> DomainResult<IncomingLetter> {
        if !self.holds_any(ctx, &self.policy.intake).await? {
            return Err(DomainError::forbidden(format!("requires {}", self.policy.intake)));
        }
        let letter = input.into_letter(ctx.identity_id, self.now())?;
        self.stores.incoming.insert(&letter).await?;
        tracing::info!(letter_id = %letter.id, priority = letter.priority.as_str(), "incoming letter registered");
        Ok(letter)
    }

    pub async fn find_incoming(&self, id: IncomingLetterId) -> DomainResult<IncomingLetter> {
        self.stores
            .incoming
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("incoming letter"))
    }

    pub async fn get_incoming(&self, id: IncomingLetterId) -> DomainResult<IncomingDetail> {
        let letter = self.find_incoming(id).await?;
        let dispositions = self.stores.dispositions.for_letter(id).await?;
        Ok(IncomingDetail {
            letter,
            dispositions,
        })
    }

    pub async fn list_incoming(
        &self,
        filter: &IncomingFilter,
        page: PageRequest,
    ) -> DomainResult<Page<IncomingLetter>> {
        Ok(self.stores.incoming.list(filter, page).await?)
    }

    /// Manual status change by the receiver or intake staff.
    ///
    /// Completing by hand is refused while any disposition is still open.
    #[tracing::instrument(skip(self, ctx, note), fields(identity_id = %ctx.identity_id), err)]
    pub async fn update_incoming_status(
        &self,
        ctx: &AuthorizedContext,
        id: IncomingLetterId,
        status: IncomingStatus,
        note: Option<String>,
    ) -> DomainResult<IncomingLetter> {
        let mut letter = self.find_incoming(id).await?;
        if letter.status.is_terminal() {
            return Err(DomainError::conflict("letter is already completed"));
        }
        self.ensure_can_manage(ctx, &letter).await?;
        if status.is_terminal() {
            let dispositions = self.stores.dispositions.for_letter(id).await?;
            if dispositions.iter().any(|d| !d.status.is_completed()) {
                return Err(DomainError::conflict("letter still has open dispositions"));
            }
        }

        let observed = letter.status;
        letter.set_status(status, note, self.now());
        self.write_incoming(&letter, &[observed]).await?;
        tracing::info!(letter_id = %id, from = %observed, to = %status, "incoming letter status changed");
        Ok(letter)
    }

    #[tracing::instrument(skip(self, ctx, patch), fields(identity_id = %ctx.identity_id), err)]
    pub async fn edit_incoming(
        &self,
        ctx: &AuthorizedContext,
        id: IncomingLetterId,
        patch: IncomingPatch,
    ) -> DomainResult<IncomingLetter> {
        let mut letter = self.find_incoming(id).await?;
        if letter.status.is_terminal() {
            return Err(DomainError::conflict("a completed letter cannot be edited"));
        }
        self.ensure_can_manage(ctx, &letter).await?;

        let observed = letter.status;
        let replaced = patch.apply(&mut letter, self.now())?;
        self.write_incoming(&letter, &[observed]).await?;
        self.discard_attachment(replaced).await;
        tracing::info!(letter_id = %id, "incoming letter edited");
        Ok(letter)
    }

    /// Receiver or admin. Dispositions go with the letter.
    #[tracing::instrument(skip(self, ctx), fields(identity_id = %ctx.identity_id), err)]
    pub async fn delete_incoming(&self, ctx: &AuthorizedContext, id: IncomingLetterId) -> DomainResult<()> {
        let letter = self.find_incoming(id).await?;
        if !letter.is_received_by(ctx.identity_id) && !self.is_admin(ctx).await? {
            return Err(DomainError::forbidden("only the receiver can delete this letter"));
        }
        if !self.stores.incoming.delete(id).await? {
            return Err(DomainError::not_found("incoming letter"));
        }
        self.discard_attachment(letter.attachment).await;
        tracing::info!(letter_id = %id, "incoming letter deleted");
        Ok(())
    }

    async fn ensure_can_manage(&self, ctx: &AuthorizedContext, letter: &IncomingLetter) -> DomainResult<()> {
        if letter.is_received_by(ctx.identity_id)
            || self.is_admin(ctx).await?
            || self.holds_any(ctx, &self.policy.intake).await?
        {
            Ok(())
        } else {
            Err(DomainError::forbidden("not allowed to manage this letter"))
        }
    }

    async fn write_incoming(&self, letter: &IncomingLetter, expected: &[IncomingStatus]) -> DomainResult<()> {
        if self.stores.incoming.update_if(letter, expected).await? {
            Ok(())
        } else {
            Err(DomainError::conflict(
                "incoming letter changed concurrently; reload and retry",
            ))
        }
    }
}
