//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `auth::AuthError`.

use anyhow::{Context, bail};
use auth::store::SessionRepository;
use auth::{AuthConfig, InMemoryAuthRepository, PgAuthRepository, auth_router, auth_router_generic};
use axum::{
    Router, http,
    http::{Method, header},
};
use platform::crypto::from_base64;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 5000;
const MIN_SECRET_BYTES: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_auth_config()?;
    let auth_routes = build_auth_routes(config).await?;

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/auth", auth_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = match env::var("PORT") {
        Ok(port) => port.parse().context("PORT must be a valid port number")?,
        Err(_) => DEFAULT_PORT,
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Signing secret from `JWT_SECRET` (standard base64)
fn load_auth_config() -> anyhow::Result<AuthConfig> {
    match env::var("JWT_SECRET") {
        Ok(secret_b64) => {
            let secret = from_base64(&secret_b64).context("JWT_SECRET must be valid base64")?;
            if secret.len() < MIN_SECRET_BYTES {
                bail!("JWT_SECRET must decode to at least {MIN_SECRET_BYTES} bytes");
            }
            Ok(AuthConfig::with_secret(secret))
        }
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("JWT_SECRET not set, using a random development secret");
            Ok(AuthConfig::development())
        }
        Err(_) => bail!("JWT_SECRET must be set in production"),
    }
}

/// PostgreSQL-backed routes, or the in-memory store in debug builds without a database
async fn build_auth_routes(config: AuthConfig) -> anyhow::Result<Router> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            return Ok(auth_router_generic(InMemoryAuthRepository::new(), config));
        }
        Err(_) => bail!("DATABASE_URL must be set in environment"),
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    tracing::info!("Migrations completed");

    // Startup cleanup: sessions not rotated within the refresh TTL
    // Errors here should not prevent server startup
    let repo = PgAuthRepository::new(pool);
    let cutoff = chrono::TimeDelta::try_seconds(config.refresh_token_ttl_secs())
        .and_then(|ttl| chrono::Utc::now().checked_sub_signed(ttl));
    let Some(cutoff) = cutoff else {
        tracing::warn!("Refresh TTL out of range, skipping session cleanup");
        return Ok(auth_router(repo, config));
    };
    match repo.cleanup_expired(cutoff).await {
        Ok(sessions) => {
            tracing::info!(
                sessions_deleted = sessions,
                "Auth session cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Auth session cleanup failed, continuing anyway"
            );
        }
    }

    Ok(auth_router(repo, config))
}
