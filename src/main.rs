use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};

use lectern::logging::{init_tracing, shutdown_tracer};
use lectern::metrics::{init_metrics, metrics_app};
use lectern::router::init_router;
use lectern::state::AppState;
use lectern::store::MemoryStore;
use lectern_config::{CorsConfig, EmailConfig, JwtConfig, ServerConfig};
use lectern_db::{init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Lectern API server", long_about = None)]
struct Args {
    /// Keep all data in process memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// Skip applying database migrations on start-up
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    init_tracing()?;

    let server_config = ServerConfig::from_env();
    let jwt_config = JwtConfig::from_env();
    let cors_config = CorsConfig::from_env();

    let state = if args.in_memory {
        warn!("Running with the in-memory store, data is lost on exit");
        AppState::in_memory(Arc::new(MemoryStore::new()), jwt_config, cors_config)
    } else {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let pool = init_db_pool(&database_url, server_config.database_max_connections)
            .await
            .context("Failed to connect to database")?;
        if !args.skip_migrations {
            run_migrations(&pool).await?;
        }
        AppState::postgres(pool, jwt_config, cors_config, EmailConfig::from_env())
    };

    let mut app = init_router(state);
    if let Some(handle) = init_metrics()? {
        app = app.merge(metrics_app(handle));
    }

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(address = %address, "Server running");
    info!("Swagger UI available at http://{address}/swagger-ui");
    info!("Scalar UI available at http://{address}/scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
