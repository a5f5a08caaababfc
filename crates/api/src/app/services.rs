use std::sync::Arc;
use std::time::Duration;

use warta_auth::{
    AuthGate, IdentityRepository, PasswordHasher, RoleRepository, RoleResolver, SessionService,
    TokenRepository, TokenStore,
};
use warta_core::{Clock, SystemClock};
use warta_infra::seed::{bootstrap_admin, seed_roles};
use warta_infra::{
    Argon2PasswordHasher, InMemoryAttachmentStore, InMemoryAuthStore, InMemoryLetterStore, PgStore,
    Settings,
};
use warta_letters::{LetterLifecycle, LetterPolicy, LetterStores};

/// Which adapters back the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

/// Everything the handlers need, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub sessions: SessionService,
    pub gate: AuthGate,
    pub lifecycle: LetterLifecycle,
    pub policy: LetterPolicy,
    pub storage: StorageBackend,
    pub debug: bool,
    pub request_timeout: Duration,
}

struct Ports {
    identities: Arc<dyn IdentityRepository>,
    tokens: Arc<dyn TokenRepository>,
    roles: Arc<dyn RoleRepository>,
    letters: LetterStores,
    storage: StorageBackend,
}

impl AppServices {
    /// PostgreSQL when `DATABASE_URL` is configured, in-memory otherwise.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::default());
        match &settings.database_url {
            Some(url) => Self::postgres(settings, url, hasher).await,
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory storage");
                Self::in_memory(settings, hasher).await
            }
        }
    }

    pub async fn in_memory(settings: &Settings, hasher: Arc<dyn PasswordHasher>) -> anyhow::Result<Self> {
        let auth = Arc::new(InMemoryAuthStore::new());
        let letters = Arc::new(InMemoryLetterStore::new());
        let ports = Ports {
            identities: auth.clone(),
            tokens: auth.clone(),
            roles: auth,
            letters: LetterStores {
                outgoing: letters.clone(),
                incoming: letters.clone(),
                dispositions: letters,
                attachments: Arc::new(InMemoryAttachmentStore::new()),
            },
            storage: StorageBackend::Memory,
        };
        Self::wire(settings, ports, hasher, Arc::new(SystemClock)).await
    }

    async fn postgres(settings: &Settings, url: &str, hasher: Arc<dyn PasswordHasher>) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::connect(url, settings.db_pool_size).await?);
        store.migrate().await?;
        let ports = Ports {
            identities: store.clone(),
            tokens: store.clone(),
            roles: store.clone(),
            letters: LetterStores {
                outgoing: store.clone(),
                incoming: store.clone(),
                dispositions: store,
                // Blobs live outside the database; discarded paths are only recorded.
                attachments: Arc::new(InMemoryAttachmentStore::new()),
            },
            storage: StorageBackend::Postgres,
        };
        Self::wire(settings, ports, hasher, Arc::new(SystemClock)).await
    }

    async fn wire(
        settings: &Settings,
        ports: Ports,
        hasher: Arc<dyn PasswordHasher>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        seed_roles(ports.roles.as_ref()).await?;

        let tokens = TokenStore::new(ports.tokens, clock.clone()).with_ttl(settings.token_ttl);
        let roles = RoleResolver::new(ports.roles);

        if let Some(admin) = &settings.bootstrap_admin {
            bootstrap_admin(
                ports.identities.as_ref(),
                &roles,
                hasher.as_ref(),
                clock.as_ref(),
                admin,
            )
            .await?;
        }

        let gate = AuthGate::new(tokens.clone(), ports.identities.clone(), roles.clone());
        let sessions = SessionService::new(
            ports.identities.clone(),
            tokens,
            roles.clone(),
            hasher,
            clock.clone(),
        );
        let lifecycle = LetterLifecycle::new(
            ports.letters,
            ports.identities,
            roles,
            clock,
            settings.policy.clone(),
        );

        tracing::info!(storage = ports.storage.as_str(), "services wired");
        Ok(Self {
            sessions,
            gate,
            lifecycle,
            policy: settings.policy.clone(),
            storage: ports.storage,
            debug: settings.debug,
            request_timeout: settings.request_timeout,
        })
    }
}
