use std::sync::Arc;

use auth::PasswordHasher;
use custos::config::Config;
use custos::domain::token::TokenService;
use custos::domain::user::ports::AuthServicePort;
use custos::domain::user::service::AuthService;
use custos::inbound::http::router::create_router;
use custos::outbound::repositories::InMemoryUserDirectory;
use custos::outbound::repositories::PostgresUserDirectory;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_DB_CONNECTIONS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custos=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "custos",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        request_timeout_secs = config.server.request_timeout_secs,
        token_ttl_seconds = config.jwt.ttl_seconds,
        issuer = %config.jwt.issuer,
        persistence = if config.database.url.is_some() { "postgresql" } else { "in_memory" },
        "Configuration loaded"
    );

    let tokens = Arc::new(TokenService::new(&config.token_settings())?);
    let hasher = PasswordHasher::new(config.hashing_params())?;
    let policy = config.credential_policy()?;

    let auth_service: Arc<dyn AuthServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(MAX_DB_CONNECTIONS)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = MAX_DB_CONNECTIONS,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let directory = Arc::new(PostgresUserDirectory::new(pg_pool));
            Arc::new(AuthService::new(directory, tokens, hasher, policy))
        }
        None => {
            tracing::warn!("No database url configured, users are kept in memory and lost on restart");

            let directory = Arc::new(InMemoryUserDirectory::new());
            Arc::new(AuthService::new(directory, tokens, hasher, policy))
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

    let http_application = create_router(auth_service, config.request_timeout());

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
