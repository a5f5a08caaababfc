use warta_auth::AuthorizedContext;
use warta_core::{DispositionId, DomainError, DomainResult, IncomingLetterId, Page, PageRequest};

use super::LetterLifecycle;
use crate::disposition::{Disposition, DispositionStatus, DispositionStep, NewDisposition};
use crate::repository::OpenOutcome;

impl LetterLifecycle {
    /// Route an incoming letter to a recipient; the letter becomes `processed`.
    #[tracing::instrument(skip(self, ctx, input), fields(identity_id = %ctx.identity_id), err)]
    pub async fn create_disposition(
        &self,
        ctx: &AuthorizedContext,
        input: NewDisposition,
    ) -> DomainResult<Disposition> {
        if self.identities.find_by_id(input.to_identity).await?.is_none() {
            return Err(DomainError::not_found("recipient"));
        }
        let disposition = input.into_disposition(ctx.identity_id, self.now());
        match self.stores.dispositions.open(&disposition).await {
            Ok(OpenOutcome::Opened) => {}
            Ok(OpenOutcome::LetterMissing) => return Err(DomainError::not_found("incoming letter")),
            Ok(OpenOutcome::LetterClosed) => {
                return Err(DomainError::conflict(
                    "a completed letter cannot be dispositioned",
                ));
            }
            Err(warta_core::StoreError::Conflict(_)) => {
                return Err(DomainError::conflict(
                    "this letter was already dispositioned to that recipient by you",
                ));
            }
            Err(err) => return Err(err.into()),
        }
        tracing::info!(
            disposition_id = %disposition.id,
            letter_id = %disposition.letter_id,
            to = %disposition.to_identity,
            "disposition opened"
        );
        Ok(disposition)
    }

    pub async fn get_disposition(&self, id: DispositionId) -> DomainResult<Disposition> {
        self.stores
            .dispositions
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("disposition"))
    }

    /// Acknowledge receipt. Rejected once processing has started.
    pub async fn mark_disposition_read(
        &self,
        ctx: &AuthorizedContext,
        id: DispositionId,
    ) -> DomainResult<Disposition> {
        self.step(ctx, id, DispositionStep::Read, None).await
    }

    pub async fn start_disposition(
        &self,
        ctx: &AuthorizedContext,
        id: DispositionId,
    ) -> DomainResult<Disposition> {
        self.step(ctx, id, DispositionStep::StartProcessing, None).await
    }

    /// Complete the disposition, then settle its letter.
    pub async fn complete_disposition(
        &self,
        ctx: &AuthorizedContext,
        id: DispositionId,
        note: Option<String>,
    ) -> DomainResult<Disposition> {
        let disposition = self.step(ctx, id, DispositionStep::Complete, note).await?;
        self.settle_letter(disposition.letter_id).await?;
        Ok(disposition)
    }

    #[tracing::instrument(skip(self, ctx, note), fields(identity_id = %ctx.identity_id, step = step.as_str()), err)]
    async fn step(
        &self,
        ctx: &AuthorizedContext,
        id: DispositionId,
        step: DispositionStep,
        note: Option<String>,
    ) -> DomainResult<Disposition> {
        let mut disposition = self.get_disposition(id).await?;
        if !disposition.is_recipient(ctx.identity_id) {
            return Err(DomainError::forbidden(
                "only the recipient can act on this disposition",
            ));
        }
        let allowed = step.allowed_from();
        if !allowed.contains(&disposition.status) {
            return Err(DomainError::conflict(format!(
                "cannot {} a disposition that is {}",
                step.as_str(),
                disposition.status
            )));
        }
        disposition.advance(step, note, self.now());
        if !self.stores.dispositions.update_if(&disposition, allowed).await? {
            return Err(DomainError::conflict(
                "disposition changed concurrently; reload and retry",
            ));
        }
        tracing::info!(disposition_id = %id, status = %disposition.status, "disposition advanced");
        Ok(disposition)
    }

    /// Complete the letter once every disposition is completed.
    ///
    /// The store rescans all dispositions of the letter under the same lock
    /// as the write. Safe to run more than once; returns whether this call
    /// moved the letter.
    pub async fn settle_letter(&self, letter: IncomingLetterId) -> DomainResult<bool> {
        let moved = self
            .stores
            .incoming
            .complete_if_settled(letter, self.now())
            .await?;
        if moved {
            tracing::info!(letter_id = %letter, "incoming letter completed");
        }
        Ok(moved)
    }

    /// Withdraw a disposition that is not completed yet. Sender or admin.
    #[tracing::instrument(skip(self, ctx), fields(identity_id = %ctx.identity_id), err)]
    pub async fn delete_disposition(&self, ctx: &AuthorizedContext, id: DispositionId) -> DomainResult<()> {
        let disposition = self.get_disposition(id).await?;
        if disposition.status.is_completed() {
            return Err(DomainError::conflict("a completed disposition cannot be deleted"));
        }
        if !disposition.is_sender(ctx.identity_id) && !self.is_admin(ctx).await? {
            return Err(DomainError::forbidden("only the sender can delete this disposition"));
        }
        let open = [
            DispositionStatus::Pending,
            DispositionStatus::Received,
            DispositionStatus::Processing,
        ];
        if !self.stores.dispositions.delete_if(id, &open).await? {
            return Err(DomainError::conflict(
                "disposition changed concurrently; reload and retry",
            ));
        }
        tracing::info!(disposition_id = %id, "disposition deleted");
        self.settle_letter(disposition.letter_id).await?;
        Ok(())
    }

    pub async fn list_letter_dispositions(&self, letter: IncomingLetterId) -> DomainResult<Vec<Disposition>> {
        self.find_incoming(letter).await?;
        Ok(self.stores.dispositions.for_letter(letter).await?)
    }

    pub async fn list_received_dispositions(
        &self,
        ctx: &AuthorizedContext,
        status: Option<DispositionStatus>,
        page: PageRequest,
    ) -> DomainResult<Page<Disposition>> {
        Ok(self
            .stores
            .dispositions
            .received_by(ctx.identity_id, status, page)
            .await?)
    }

    pub async fn list_sent_dispositions(
        &self,
        ctx: &AuthorizedContext,
        page: PageRequest,
    ) -> DomainResult<Page<Disposition>> {
        Ok(self.stores.dispositions.sent_by(ctx.identity_id, page).await?)
    }
}
