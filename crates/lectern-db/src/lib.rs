//! # Lectern DB
//!
//! Database pool and migrations for the Lectern API.
//!
//! This crate creates the SQLx PostgreSQL connection pool and applies the
//! embedded migrations from the repository's `migrations/` directory.
//!
//! # Example
//!
//! ```ignore
//! use lectern_db::{init_db_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlx::Error> {
//!     let pool = init_db_pool(&std::env::var("DATABASE_URL").unwrap(), 10).await?;
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Initializes a PostgreSQL connection pool.
///
/// The returned pool is cheaply cloneable and should be shared through the
/// application state rather than created per request.
///
/// # Errors
///
/// Returns the SQLx error if the database cannot be reached.
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    tracing::info!(max_connections, "Connecting to database");

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Applies all pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
