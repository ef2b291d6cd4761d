use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardkeeper_common::RedisService;
use boardkeeper_moderation::{
    audit::{AuditSink, NoopAuditSink, RedisAuditSink},
    config::ModerationConfig,
    directory::{Directory, HttpDirectory, InMemoryDirectory},
    routes::{self, handler_404},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "boardkeeper_moderation=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = ModerationConfig::from_env()?;

    let directory: Arc<dyn Directory> = match &config.directory.base_url {
        Some(base_url) => {
            tracing::info!("Resolving content and members via {}", base_url);
            Arc::new(HttpDirectory::new(base_url, &config.directory)?)
        }
        None => {
            tracing::warn!("CONTENT_SERVICE_URL not set; using an empty in-memory directory");
            Arc::new(InMemoryDirectory::new())
        }
    };

    let audit: Arc<dyn AuditSink> = if config.redis.enabled {
        let redis_service = RedisService::new(&config.redis).await?;
        Arc::new(RedisAuditSink::new(redis_service, config.rules.audit_channel.clone()))
    } else {
        tracing::info!("Audit fan-out disabled");
        Arc::new(NoopAuditSink)
    };

    let app_state = AppState::new(config.clone(), directory, audit);

    // Natural expiry runs in the background for the life of the process
    let _sweep = app_state
        .suspension_service
        .spawn_expiry_sweep(config.rules.sweep_interval_seconds);

    // Build CORS layer
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(origins);

    // Build the application
    let app = routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .fallback(handler_404)
        .with_state(app_state);

    // Start the server
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
        .await?;

    tracing::info!("Moderation service listening on {}:{}", config.server.host, config.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
