use std::sync::Arc;

use identity_service::config::Config;
use identity_service::config::StoreBackend;
use identity_service::outbound::repositories::InMemoryCredentialStore;
use identity_service::outbound::repositories::PostgresCredentialStore;
use identity_service::startup::build_router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        store = ?config.database.backend,
        jwt_algorithm = ?config.jwt.algorithm,
        jwt_expiration_minutes = config.jwt.expiration_minutes,
        "Configuration loaded"
    );

    let http_application = match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!(store = "memory", "Using in-memory credential store, data is not persisted");
            build_router(Arc::new(InMemoryCredentialStore::new()), &config)?
        }
        StoreBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            build_router(Arc::new(PostgresCredentialStore::new(pg_pool)), &config)?
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, http_application).await?;
    tracing::info!("Server exited");

    Ok(())
}
