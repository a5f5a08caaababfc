//! Letter Lifecycle service.
//!
//! Every operation takes the caller's [`AuthorizedContext`] explicitly. Checks
//! run in the order NotFound, then status, then ownership/role, and the final
//! write is a status compare-and-set so concurrent transitions cannot both win.

mod disposition;
mod incoming;
mod outgoing;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use warta_auth::{AuthorizedContext, IdentityRepository, RequiredRoles, RoleResolver};
use warta_core::{Clock, DomainResult};

use crate::attachment::AttachmentStore;
use crate::disposition::Disposition;
use crate::incoming::IncomingLetter;
use crate::policy::LetterPolicy;
use crate::repository::{DispositionRepository, IncomingLetterRepository, OutgoingLetterRepository};

/// Persistence ports the lifecycle writes through.
#[derive(Clone)]
pub struct LetterStores {
    pub outgoing: Arc<dyn OutgoingLetterRepository>,
    pub incoming: Arc<dyn IncomingLetterRepository>,
    pub dispositions: Arc<dyn DispositionRepository>,
    pub attachments: Arc<dyn AttachmentStore>,
}

/// An incoming letter together with its dispositions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingDetail {
    #[serde(flatten)]
    pub letter: IncomingLetter,
    pub dispositions: Vec<Disposition>,
}

#[derive(Clone)]
pub struct LetterLifecycle {
    stores: LetterStores,
    identities: Arc<dyn IdentityRepository>,
    roles: RoleResolver,
    clock: Arc<dyn Clock>,
    policy: LetterPolicy,
}

impl LetterLifecycle {
    pub fn new(
        stores: LetterStores,
        identities: Arc<dyn IdentityRepository>,
        roles: RoleResolver,
        clock: Arc<dyn Clock>,
        policy: LetterPolicy,
    ) -> Self {
        Self {
            stores,
            identities,
            roles,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &LetterPolicy {
        &self.policy
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn holds_any(&self, ctx: &AuthorizedContext, roles: &RequiredRoles) -> DomainResult<bool> {
        if roles.is_empty() {
            return Ok(false);
        }
        Ok(self.roles.has_any_role(ctx.identity_id, roles).await?)
    }

    async fn is_admin(&self, ctx: &AuthorizedContext) -> DomainResult<bool> {
        self.holds_any(ctx, &self.policy.admins).await
    }

    /// Blob removal never fails the request that made the blob unreferenced.
    async fn discard_attachment(&self, path: Option<String>) {
        let Some(path) = path else { return };
        if let Err(err) = self.stores.attachments.discard(&path).await {
            tracing::warn!(path = %path, error = %err, "failed to discard attachment");
        }
    }
}
