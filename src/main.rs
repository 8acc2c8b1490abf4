use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use chirpy::auth::{AuthService, PgRefreshTokenStore, RefreshTokenStore};
use chirpy::configuration::{get_configuration, Settings};
use chirpy::memory::{InMemoryRefreshTokenStore, InMemoryUserRepository};
use chirpy::startup::run;
use chirpy::telemetry::init_telemetry;
use chirpy::users::{PgUserRepository, UserRepository};

type Stores = (Arc<dyn UserRepository>, Arc<dyn RefreshTokenStore>);

async fn build_stores(configuration: &Settings) -> std::io::Result<Stores> {
    let ttl = configuration.auth.refresh_token_ttl();

    if configuration.database.in_memory {
        tracing::warn!("Using in-memory stores; accounts are lost on restart");
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let refresh_tokens: Arc<dyn RefreshTokenStore> =
            Arc::new(InMemoryRefreshTokenStore::new(ttl));
        return Ok((users, refresh_tokens));
    }

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
        })?;

    tracing::info!("Database connection pool created successfully");
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let refresh_tokens: Arc<dyn RefreshTokenStore> = Arc::new(PgRefreshTokenStore::new(pool, ttl));
    Ok((users, refresh_tokens))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let (users, refresh_tokens) = build_stores(&configuration).await?;
    let auth_service = AuthService::new(configuration.auth.clone(), users, refresh_tokens);

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, auth_service, configuration.allows_reset())?;
    tracing::info!(platform = %configuration.platform, "Server started successfully");

    server.await
}
