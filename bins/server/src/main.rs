//! Vantage API Server
//!
//! Main entry point for the Vantage visibility service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vantage_api::{AppState, create_router};
use vantage_core::visibility::{TeamCache, VisibilityService};
use vantage_db::{ModuleRepository, RolePermissionRepository, UserRepository, connect};
use vantage_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vantage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = Arc::new(connect(&config.database).await?);
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    });

    // One team cache for the whole process
    let cache = TeamCache::with_capacity(config.visibility.cache_max_capacity);
    let visibility = VisibilityService::new(
        Arc::new(UserRepository::new(Arc::clone(&db))),
        Arc::new(RolePermissionRepository::new(Arc::clone(&db))),
        Arc::new(ModuleRepository::new(Arc::clone(&db))),
        cache,
    );
    info!(
        cache_max_capacity = config.visibility.cache_max_capacity,
        "Visibility engine configured"
    );

    let state = AppState {
        db,
        jwt_service: Arc::new(jwt_service),
        visibility: Arc::new(visibility),
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
