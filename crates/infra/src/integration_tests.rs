//! Integration tests for the gate, sessions and letter lifecycle wired over
//! the in-memory adapters.
//!
//! Verifies:
//! - The gate fails fast in its documented order
//! - Outgoing approval is role-gated and single-shot
//! - Dispositions drive the incoming letter to `completed`
//! - Stale compare-and-set writes are rejected
//! - A disposition opened mid-settle keeps its letter open

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    use warta_auth::{
        AuthError, AuthGate, AuthorizedContext, IdentityRepository, IdentityStatus,
        RegisterIdentity, RequiredRoles, Role, RoleResolver, SessionService, TokenStore,
        UnauthenticatedReason,
    };
    use warta_core::{
        Clock, DispositionId, DomainError, IncomingLetterId, ManualClock, Page, PageRequest,
        StoreResult,
    };
    use warta_letters::{
        Disposition, DispositionRepository, DispositionStatus, IncomingFilter, IncomingLetter,
        IncomingLetterRepository, IncomingStatus, LetterLifecycle, LetterPolicy, LetterStores,
        NewDisposition, NewIncomingLetter, NewOutgoingLetter, OutgoingLetterRepository,
        OutgoingPatch, OutgoingStatus, Priority,
    };

    use crate::crypto::Argon2PasswordHasher;
    use crate::memory::{InMemoryAttachmentStore, InMemoryAuthStore, InMemoryLetterStore};
    use crate::seed::seed_roles;

    struct Harness {
        auth: Arc<InMemoryAuthStore>,
        letters: Arc<InMemoryLetterStore>,
        attachments: Arc<InMemoryAttachmentStore>,
        clock: Arc<ManualClock>,
        gate: AuthGate,
        sessions: SessionService,
        lifecycle: LetterLifecycle,
    }

    struct Member {
        ctx: AuthorizedContext,
        credential: String,
    }

    async fn setup_with_ttl(ttl: Option<Duration>) -> Harness {
        let auth = Arc::new(InMemoryAuthStore::new());
        let letters = Arc::new(InMemoryLetterStore::new());
        let attachments = Arc::new(InMemoryAttachmentStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        seed_roles(auth.as_ref()).await.unwrap();

        let tokens = TokenStore::new(auth.clone(), clock.clone()).with_ttl(ttl);
        let roles = RoleResolver::new(auth.clone());
        let hasher = Arc::new(Argon2PasswordHasher::new(1024, 1, 1).unwrap());

        let gate = AuthGate::new(tokens.clone(), auth.clone(), roles.clone());
        let sessions = SessionService::new(
            auth.clone(),
            tokens,
            roles.clone(),
            hasher,
            clock.clone(),
        );
        let stores = LetterStores {
            outgoing: letters.clone(),
            incoming: letters.clone(),
            dispositions: letters.clone(),
            attachments: attachments.clone(),
        };
        let lifecycle = LetterLifecycle::new(
            stores,
            auth.clone(),
            roles,
            clock.clone(),
            LetterPolicy::default(),
        );

        Harness {
            auth,
            letters,
            attachments,
            clock,
            gate,
            sessions,
            lifecycle,
        }
    }

    async fn setup() -> Harness {
        setup_with_ttl(None).await
    }

    impl Harness {
        async fn member(&self, name: &str, roles: &[Role]) -> Member {
            let session = self
                .sessions
                .register(RegisterIdentity {
                    username: name.into(),
                    email: format!("{name}@dinas.go.id"),
                    password: "rahasia-123".into(),
                })
                .await
                .unwrap();
            for role in roles {
                self.sessions
                    .assign_role(session.profile.identity.id, role.clone())
                    .await
                    .unwrap();
            }
            let credential = session.token.credential;
            let ctx = self
                .gate
                .authorize(Some(credential.as_str()), &RequiredRoles::any())
                .await
                .unwrap();
            Member { ctx, credential }
        }
    }

    fn outgoing(number: &str) -> NewOutgoingLetter {
        NewOutgoingLetter {
            number: number.into(),
            letter_date: NaiveDate::from_ymd_opt(2025, 11, 16).unwrap(),
            destination: "Dinas Pendidikan".into(),
            body: "Undangan rapat koordinasi".into(),
            attachment: Some("letters/out/undangan.pdf".into()),
            note: None,
            submit: false,
        }
    }

    fn incoming(number: &str) -> NewIncomingLetter {
        NewIncomingLetter {
            number: number.into(),
            letter_date: NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
            sender: "Kementerian Kominfo".into(),
            subject: "Undangan Sosialisasi".into(),
            body: None,
            attachment: None,
            priority: Priority::High,
            note: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth gate
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn gate_rejects_missing_and_unknown_tokens() {
        let h = setup().await;
        let any = RequiredRoles::any();

        let err = h.gate.authorize(None, &any).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(UnauthenticatedReason::NoToken));

        let err = h.gate.authorize(Some("   "), &any).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(UnauthenticatedReason::NoToken));

        let err = h.gate.authorize(Some("7|not-a-real-secret"), &any).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthenticated(UnauthenticatedReason::InvalidOrExpired)
        );
    }

    #[tokio::test]
    async fn gate_checks_roles_after_identity() {
        let h = setup().await;
        let staff = h.member("staf", &[]).await;

        let admin_only = RequiredRoles::parse("admin");
        let err = h
            .gate
            .authorize(Some(staff.credential.as_str()), &admin_only)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Forbidden { required: admin_only });

        let ctx = h
            .gate
            .authorize(Some(staff.credential.as_str()), &RequiredRoles::parse("admin|user"))
            .await
            .unwrap();
        assert_eq!(ctx.username, "staf");
    }

    #[tokio::test]
    async fn expired_tokens_stay_rejected() {
        let h = setup_with_ttl(Some(Duration::minutes(30))).await;
        let staff = h.member("staf", &[]).await;

        h.clock.advance(Duration::minutes(30));
        for _ in 0..2 {
            let err = h
                .gate
                .authorize(Some(staff.credential.as_str()), &RequiredRoles::any())
                .await
                .unwrap_err();
            assert_eq!(
                err,
                AuthError::Unauthenticated(UnauthenticatedReason::InvalidOrExpired)
            );
        }
    }

    #[tokio::test]
    async fn inactive_identity_is_unauthenticated_before_role_check() {
        let h = setup().await;
        let staff = h.member("staf", &[]).await;

        // Bypass the session service so the token survives the status change.
        h.auth
            .set_status(staff.ctx.identity_id, IdentityStatus::Inactive, Utc::now())
            .await
            .unwrap();

        let err = h
            .gate
            .authorize(Some(staff.credential.as_str()), &RequiredRoles::parse("admin"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthenticated(UnauthenticatedReason::Inactive));
    }

    #[tokio::test]
    async fn suspending_an_identity_revokes_all_sessions() {
        let h = setup().await;
        let staff = h.member("staf", &[]).await;
        let second = h.sessions.login("staf@dinas.go.id", "rahasia-123").await.unwrap();

        h.sessions
            .set_status(staff.ctx.identity_id, IdentityStatus::Suspended)
            .await
            .unwrap();

        for credential in [staff.credential.as_str(), second.token.credential.as_str()] {
            let err = h
                .gate
                .authorize(Some(credential), &RequiredRoles::any())
                .await
                .unwrap_err();
            assert_eq!(
                err,
                AuthError::Unauthenticated(UnauthenticatedReason::InvalidOrExpired)
            );
        }

        let err = h.sessions.login("staf", "rahasia-123").await.unwrap_err();
        assert_eq!(
            err,
            warta_auth::SessionError::Domain(DomainError::forbidden("account is suspended"))
        );
    }

    #[tokio::test]
    async fn logout_revokes_only_the_presented_token() {
        let h = setup().await;
        let staff = h.member("staf", &[]).await;
        let other = h.sessions.login("staf", "rahasia-123").await.unwrap();

        h.sessions.logout(&staff.ctx, &staff.credential).await.unwrap();

        assert!(
            h.gate
                .authorize(Some(staff.credential.as_str()), &RequiredRoles::any())
                .await
                .is_err()
        );
        assert!(
            h.gate
                .authorize(Some(other.token.credential.as_str()), &RequiredRoles::any())
                .await
                .is_ok()
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Outgoing letters
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn outgoing_letter_is_approved_once_by_an_approver() {
        let h = setup().await;
        let author = h.member("penulis", &[]).await;
        let peer = h.member("rekan", &[]).await;
        let chief = h.member("redaktur", &[Role::REDAKTUR]).await;

        let letter = h
            .lifecycle
            .create_outgoing(&author.ctx, outgoing("001/SK/2025"))
            .await
            .unwrap();
        assert_eq!(letter.status, OutgoingStatus::Draft);
        h.lifecycle.submit_outgoing(&author.ctx, letter.id).await.unwrap();

        let err = h
            .lifecycle
            .approve_outgoing(&peer.ctx, letter.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let approved = h
            .lifecycle
            .approve_outgoing(&chief.ctx, letter.id, Some("ok".into()))
            .await
            .unwrap();
        assert_eq!(approved.status, OutgoingStatus::Approved);
        assert_eq!(approved.approved_by, Some(chief.ctx.identity_id));
        assert_eq!(approved.note.as_deref(), Some("ok"));

        let err = h
            .lifecycle
            .approve_outgoing(&chief.ctx, letter.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn deciding_a_draft_is_a_conflict_even_without_the_role() {
        let h = setup().await;
        let author = h.member("penulis", &[]).await;
        let letter = h
            .lifecycle
            .create_outgoing(&author.ctx, outgoing("002/SK/2025"))
            .await
            .unwrap();

        let err = h
            .lifecycle
            .reject_outgoing(&author.ctx, letter.id, "revisi".into())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn duplicate_outgoing_number_conflicts() {
        let h = setup().await;
        let author = h.member("penulis", &[]).await;
        h.lifecycle
            .create_outgoing(&author.ctx, outgoing("003/SK/2025"))
            .await
            .unwrap();
        let err = h
            .lifecycle
            .create_outgoing(&author.ctx, outgoing("003/SK/2025"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn stale_status_write_loses_the_race() {
        let h = setup().await;
        let author = h.member("penulis", &[]).await;
        let chief = h.member("redaktur", &[Role::REDAKTUR]).await;

        let mut input = outgoing("004/SK/2025");
        input.submit = true;
        let letter = h.lifecycle.create_outgoing(&author.ctx, input).await.unwrap();
        let stale = letter.clone();

        h.lifecycle
            .reject_outgoing(&chief.ctx, letter.id, "nomor salah".into())
            .await
            .unwrap();

        // A second approver that read the letter while it was still pending.
        let mut late = stale;
        late.status = OutgoingStatus::Approved;
        let landed =
            OutgoingLetterRepository::update_if(h.letters.as_ref(), &late, &[OutgoingStatus::Pending])
                .await
                .unwrap();
        assert!(!landed);

        let stored = h.lifecycle.get_outgoing(letter.id).await.unwrap();
        assert_eq!(stored.status, OutgoingStatus::Rejected);
    }

    #[tokio::test]
    async fn rejected_letter_is_edited_and_resubmitted() {
        let h = setup().await;
        let author = h.member("penulis", &[]).await;
        let chief = h.member("redaktur", &[Role::REDAKTUR]).await;

        let mut input = outgoing("005/SK/2025");
        input.submit = true;
        let letter = h.lifecycle.create_outgoing(&author.ctx, input).await.unwrap();
        h.lifecycle
            .reject_outgoing(&chief.ctx, letter.id, "lampiran kurang".into())
            .await
            .unwrap();

        let edited = h
            .lifecycle
            .edit_outgoing(
                &author.ctx,
                letter.id,
                OutgoingPatch {
                    attachment: Some("letters/out/undangan-v2.pdf".into()),
                    submit: true,
                    ..OutgoingPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.status, OutgoingStatus::Pending);
        assert_eq!(
            h.attachments.discarded().unwrap(),
            vec!["letters/out/undangan.pdf".to_string()]
        );

        let err = h
            .lifecycle
            .edit_outgoing(&author.ctx, letter.id, OutgoingPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_the_creator_or_admin_may_delete() {
        let h = setup().await;
        let author = h.member("penulis", &[]).await;
        let peer = h.member("rekan", &[]).await;
        let admin = h.member("admin", &[Role::ADMIN]).await;

        let letter = h
            .lifecycle
            .create_outgoing(&author.ctx, outgoing("006/SK/2025"))
            .await
            .unwrap();

        let err = h.lifecycle.delete_outgoing(&peer.ctx, letter.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        h.lifecycle.delete_outgoing(&admin.ctx, letter.id).await.unwrap();
        let err = h.lifecycle.get_outgoing(letter.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Incoming letters and dispositions
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn completing_every_disposition_completes_the_letter() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;

        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("045/UND/XI/2025"))
            .await
            .unwrap();
        assert_eq!(letter.status, IncomingStatus::Pending);

        let disposition = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: head.ctx.identity_id,
                    instruction: Some("Mohon dihadiri".into()),
                    note: None,
                },
            )
            .await
            .unwrap();
        let processed = h.lifecycle.find_incoming(letter.id).await.unwrap();
        assert_eq!(processed.status, IncomingStatus::Processed);

        let read = h
            .lifecycle
            .mark_disposition_read(&head.ctx, disposition.id)
            .await
            .unwrap();
        assert_eq!(read.status, DispositionStatus::Received);
        assert!(read.read_at.is_some());

        let done = h
            .lifecycle
            .complete_disposition(&head.ctx, disposition.id, Some("sudah dihadiri".into()))
            .await
            .unwrap();
        assert_eq!(done.status, DispositionStatus::Completed);

        let detail = h.lifecycle.get_incoming(letter.id).await.unwrap();
        assert_eq!(detail.letter.status, IncomingStatus::Completed);
        assert_eq!(detail.dispositions.len(), 1);
        assert_eq!(detail.dispositions[0].note.as_deref(), Some("sudah dihadiri"));

        let err = h
            .lifecycle
            .complete_disposition(&head.ctx, disposition.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn completed_letters_take_no_new_dispositions() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;
        let staff = h.member("staf", &[]).await;

        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("046/UND/XI/2025"))
            .await
            .unwrap();
        let disposition = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: head.ctx.identity_id,
                    instruction: None,
                    note: None,
                },
            )
            .await
            .unwrap();
        h.lifecycle
            .complete_disposition(&head.ctx, disposition.id, None)
            .await
            .unwrap();

        let err = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: staff.ctx.identity_id,
                    instruction: None,
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn same_route_cannot_be_dispositioned_twice() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;
        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("047/UND/XI/2025"))
            .await
            .unwrap();

        let route = NewDisposition {
            letter_id: letter.id,
            to_identity: head.ctx.identity_id,
            instruction: None,
            note: None,
        };
        h.lifecycle.create_disposition(&clerk.ctx, route.clone()).await.unwrap();
        let err = h
            .lifecycle
            .create_disposition(&clerk.ctx, route)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn disposition_steps_belong_to_the_recipient() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;
        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("048/UND/XI/2025"))
            .await
            .unwrap();
        let disposition = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: head.ctx.identity_id,
                    instruction: None,
                    note: None,
                },
            )
            .await
            .unwrap();

        let err = h
            .lifecycle
            .mark_disposition_read(&clerk.ctx, disposition.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let started = h
            .lifecycle
            .start_disposition(&head.ctx, disposition.id)
            .await
            .unwrap();
        assert_eq!(started.status, DispositionStatus::Processing);
        assert!(started.read_at.is_some());

        let err = h
            .lifecycle
            .mark_disposition_read(&head.ctx, disposition.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let received = h
            .lifecycle
            .list_received_dispositions(&head.ctx, Some(DispositionStatus::Processing), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(received.total, 1);
        let sent = h
            .lifecycle
            .list_sent_dispositions(&clerk.ctx, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(sent.items[0].id, disposition.id);
    }

    #[tokio::test]
    async fn withdrawing_the_last_open_disposition_settles_the_letter() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;
        let staff = h.member("staf", &[]).await;
        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("049/UND/XI/2025"))
            .await
            .unwrap();

        let mut ids = Vec::new();
        for to in [head.ctx.identity_id, staff.ctx.identity_id] {
            let d = h
                .lifecycle
                .create_disposition(
                    &clerk.ctx,
                    NewDisposition {
                        letter_id: letter.id,
                        to_identity: to,
                        instruction: None,
                        note: None,
                    },
                )
                .await
                .unwrap();
            ids.push(d.id);
        }

        h.lifecycle.complete_disposition(&head.ctx, ids[0], None).await.unwrap();
        let still_open = h.lifecycle.find_incoming(letter.id).await.unwrap();
        assert_eq!(still_open.status, IncomingStatus::Processed);

        let err = h.lifecycle.delete_disposition(&staff.ctx, ids[1]).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        h.lifecycle.delete_disposition(&clerk.ctx, ids[1]).await.unwrap();
        let settled = h.lifecycle.find_incoming(letter.id).await.unwrap();
        assert_eq!(settled.status, IncomingStatus::Completed);

        let err = h.lifecycle.delete_disposition(&clerk.ctx, ids[0]).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn disposition_to_unknown_recipient_is_not_found() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("050/UND/XI/2025"))
            .await
            .unwrap();

        let err = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: warta_core::IdentityId::new(),
                    instruction: None,
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("recipient"));
        assert!(h.lifecycle.list_letter_dispositions(letter.id).await.unwrap().is_empty());
        assert!(h.auth.find_by_id(clerk.ctx.identity_id).await.unwrap().is_some());
    }

    /// Opens a queued disposition at the start of `complete_if_settled`, the
    /// way a concurrent `create_disposition` would interleave with a settle.
    struct OpenDuringSettle {
        inner: Arc<InMemoryLetterStore>,
        queued: Mutex<Option<Disposition>>,
    }

    #[async_trait]
    impl IncomingLetterRepository for OpenDuringSettle {
        async fn insert(&self, letter: &IncomingLetter) -> StoreResult<()> {
            IncomingLetterRepository::insert(self.inner.as_ref(), letter).await
        }

        async fn find(&self, id: IncomingLetterId) -> StoreResult<Option<IncomingLetter>> {
            IncomingLetterRepository::find(self.inner.as_ref(), id).await
        }

        async fn list(
            &self,
            filter: &IncomingFilter,
            page: PageRequest,
        ) -> StoreResult<Page<IncomingLetter>> {
            IncomingLetterRepository::list(self.inner.as_ref(), filter, page).await
        }

        async fn update_if(
            &self,
            letter: &IncomingLetter,
            expected: &[IncomingStatus],
        ) -> StoreResult<bool> {
            IncomingLetterRepository::update_if(self.inner.as_ref(), letter, expected).await
        }

        async fn complete_if_settled(
            &self,
            id: IncomingLetterId,
            at: DateTime<Utc>,
        ) -> StoreResult<bool> {
            let queued = self.queued.lock().unwrap().take();
            if let Some(disposition) = queued {
                self.inner.open(&disposition).await?;
            }
            self.inner.complete_if_settled(id, at).await
        }

        async fn delete(&self, id: IncomingLetterId) -> StoreResult<bool> {
            IncomingLetterRepository::delete(self.inner.as_ref(), id).await
        }
    }

    #[tokio::test]
    async fn disposition_opened_while_settling_keeps_the_letter_open() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;
        let staff = h.member("staf", &[]).await;
        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("051/UND/XI/2025"))
            .await
            .unwrap();
        let first = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: head.ctx.identity_id,
                    instruction: None,
                    note: None,
                },
            )
            .await
            .unwrap();

        let now = h.clock.now();
        let late = Disposition {
            id: DispositionId::new(),
            letter_id: letter.id,
            from_identity: clerk.ctx.identity_id,
            to_identity: staff.ctx.identity_id,
            instruction: Some("Mohon ditindaklanjuti".into()),
            note: None,
            status: DispositionStatus::Pending,
            read_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let incoming_store = Arc::new(OpenDuringSettle {
            inner: h.letters.clone(),
            queued: Mutex::new(Some(late.clone())),
        });
        let lifecycle = LetterLifecycle::new(
            LetterStores {
                outgoing: h.letters.clone(),
                incoming: incoming_store,
                dispositions: h.letters.clone(),
                attachments: h.attachments.clone(),
            },
            h.auth.clone(),
            RoleResolver::new(h.auth.clone()),
            h.clock.clone(),
            LetterPolicy::default(),
        );

        lifecycle
            .complete_disposition(&head.ctx, first.id, None)
            .await
            .unwrap();

        let detail = lifecycle.get_incoming(letter.id).await.unwrap();
        assert_eq!(detail.letter.status, IncomingStatus::Processed);
        assert_eq!(detail.dispositions.len(), 2);
        assert!(
            detail
                .dispositions
                .iter()
                .any(|d| d.id == late.id && d.status == DispositionStatus::Pending)
        );

        lifecycle
            .complete_disposition(&staff.ctx, late.id, None)
            .await
            .unwrap();
        let settled = lifecycle.find_incoming(letter.id).await.unwrap();
        assert_eq!(settled.status, IncomingStatus::Completed);
    }

    #[tokio::test]
    async fn manual_completion_waits_for_open_dispositions() {
        let h = setup().await;
        let clerk = h.member("sekretariat", &[Role::EDITOR]).await;
        let head = h.member("kabid", &[]).await;
        let letter = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("052/UND/XI/2025"))
            .await
            .unwrap();
        let disposition = h
            .lifecycle
            .create_disposition(
                &clerk.ctx,
                NewDisposition {
                    letter_id: letter.id,
                    to_identity: head.ctx.identity_id,
                    instruction: None,
                    note: None,
                },
            )
            .await
            .unwrap();

        let err = h
            .lifecycle
            .update_incoming_status(&clerk.ctx, letter.id, IncomingStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let unchanged = h.lifecycle.find_incoming(letter.id).await.unwrap();
        assert_eq!(unchanged.status, IncomingStatus::Processed);

        // A letter nobody was routed to can still be closed by hand.
        let direct = h
            .lifecycle
            .register_incoming(&clerk.ctx, incoming("053/UND/XI/2025"))
            .await
            .unwrap();
        let closed = h
            .lifecycle
            .update_incoming_status(&clerk.ctx, direct.id, IncomingStatus::Completed, None)
            .await
            .unwrap();
        assert_eq!(closed.status, IncomingStatus::Completed);

        h.lifecycle
            .complete_disposition(&head.ctx, disposition.id, None)
            .await
            .unwrap();
        let settled = h.lifecycle.find_incoming(letter.id).await.unwrap();
        assert_eq!(settled.status, IncomingStatus::Completed);
    }
}
