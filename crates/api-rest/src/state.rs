//! Application state and dependency injection.
//!
//! One [`AppState`] is built at startup and cloned into every handler via
//! Axum's state extraction. Backend selection happens here and nowhere else:
//! a configured `[database]` section wires the Postgres stores (running
//! migrations on the way up), a `[redis]` section wires the pub/sub channel,
//! and their absence falls back to the in-memory backend and in-process
//! channel used for development and tests.

use civicwatch_application::{
    AssignmentService, FeedService, GeoStore, IssueService, IssueStore, NotificationService,
    NotificationStore, RecipientChannel, UserDirectory,
};
use civicwatch_common::config::AppConfig;
use civicwatch_infrastructure::{
    DatabasePool, InMemoryBackend, InProcessRecipientChannel, PgIssueStore, PgNotificationStore,
    PgUserDirectory, RedisRecipientChannel,
};
use std::sync::Arc;
use tracing::info;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    issues: Arc<IssueService>,
    assignments: Arc<AssignmentService>,
    feed: Arc<FeedService>,
    notifications: Arc<NotificationService>,
    database: Option<Arc<DatabasePool>>,
}

impl AppState {
    /// Wire the services against the backends the configuration names.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let channel: Arc<dyn RecipientChannel> = match &config.redis {
            Some(settings) => {
                info!("Using Redis recipient channel");
                Arc::new(RedisRecipientChannel::new(settings).await?)
            }
            None => {
                info!("Using in-process recipient channel");
                Arc::new(InProcessRecipientChannel::new())
            }
        };

        match &config.database {
            Some(settings) => {
                let pool = Arc::new(DatabasePool::new(settings).await?);
                pool.run_migrations().await?;
                info!("Using PostgreSQL stores");

                let issue_store = Arc::new(PgIssueStore::new(&pool));
                let issues: Arc<dyn IssueStore> = issue_store.clone();
                let geo: Arc<dyn GeoStore> = issue_store;
                let users: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(&pool));
                let store: Arc<dyn NotificationStore> = Arc::new(PgNotificationStore::new(&pool));

                Ok(Self::assemble(
                    config,
                    issues,
                    geo,
                    users,
                    store,
                    channel,
                    Some(pool),
                ))
            }
            None => {
                info!("Using in-memory stores");
                Ok(Self::with_backend(
                    config,
                    Arc::new(InMemoryBackend::new()),
                    channel,
                ))
            }
        }
    }

    /// In-memory state for development and tests.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::with_backend(
            config,
            Arc::new(InMemoryBackend::new()),
            Arc::new(InProcessRecipientChannel::new()),
        )
    }

    /// In-memory state over a caller-owned backend, so tests can seed
    /// users and issues directly.
    pub fn with_backend(
        config: AppConfig,
        backend: Arc<InMemoryBackend>,
        channel: Arc<dyn RecipientChannel>,
    ) -> Self {
        Self::assemble(
            config,
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend,
            channel,
            None,
        )
    }

    fn assemble(
        config: AppConfig,
        issues: Arc<dyn IssueStore>,
        geo: Arc<dyn GeoStore>,
        users: Arc<dyn UserDirectory>,
        store: Arc<dyn NotificationStore>,
        channel: Arc<dyn RecipientChannel>,
        database: Option<Arc<DatabasePool>>,
    ) -> Self {
        let notifications = Arc::new(NotificationService::new(store, channel));
        let issue_service = Arc::new(IssueService::new(issues.clone(), notifications.clone()));
        let assignments = Arc::new(AssignmentService::new(
            issues.clone(),
            users,
            notifications.clone(),
        ));
        let feed = Arc::new(FeedService::new(issues, geo));

        Self {
            config: Arc::new(config),
            issues: issue_service,
            assignments,
            feed,
            notifications,
            database,
        }
    }

    /// Application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Secret verifying bearer tokens
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }

    /// Issue lifecycle service
    pub fn issues(&self) -> &IssueService {
        &self.issues
    }

    /// Assignment service
    pub fn assignments(&self) -> &AssignmentService {
        &self.assignments
    }

    /// Read-side feed service
    pub fn feed(&self) -> &FeedService {
        &self.feed
    }

    /// Notification delivery and retrieval service
    pub fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    /// Database pool when running on Postgres; `None` on the in-memory backend
    pub fn database(&self) -> Option<&DatabasePool> {
        self.database.as_deref()
    }
}
