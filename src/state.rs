use std::sync::Arc;

use lectern_config::{CorsConfig, EmailConfig, JwtConfig};
use lectern_db::PgPool;

use crate::notifications::{CourseUpdateNotifier, EmailNotifier, LogNotifier};
use crate::store::{
    CourseRepository, LessonRepository, MemoryStore, PaymentRepository, PgStore, RoleDirectory,
    SubscriptionRepository, UserRepository,
};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleDirectory>,
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub notifier: Arc<dyn CourseUpdateNotifier>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
}

impl AppState {
    /// Builds state where a single store backs every repository.
    pub fn from_store<S>(
        store: Arc<S>,
        notifier: Arc<dyn CourseUpdateNotifier>,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
    ) -> Self
    where
        S: UserRepository
            + RoleDirectory
            + CourseRepository
            + LessonRepository
            + SubscriptionRepository
            + PaymentRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            roles: store.clone(),
            courses: store.clone(),
            lessons: store.clone(),
            subscriptions: store.clone(),
            payments: store,
            notifier,
            jwt_config,
            cors_config,
        }
    }

    /// Postgres-backed state. Mail goes out over SMTP when enabled, otherwise
    /// updates are only logged.
    pub fn postgres(
        pool: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        email_config: EmailConfig,
    ) -> Self {
        let store = Arc::new(PgStore::new(pool));
        let notifier: Arc<dyn CourseUpdateNotifier> = if email_config.enabled {
            Arc::new(EmailNotifier::new(email_config, store.clone()))
        } else {
            Arc::new(LogNotifier)
        };

        Self::from_store(store, notifier, jwt_config, cors_config)
    }

    /// Process-local state for development and tests.
    pub fn in_memory(store: Arc<MemoryStore>, jwt_config: JwtConfig, cors_config: CorsConfig) -> Self {
        Self::from_store(store, Arc::new(LogNotifier), jwt_config, cors_config)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn CourseUpdateNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
