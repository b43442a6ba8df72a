//! Tastebook API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Request routing
//! - Observability (logging, metrics, tracing)

mod handlers;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use std::net::SocketAddr;
use std::sync::Arc;
use tastebook_common::{
    auth::{JwtManager, JwtState},
    config::AppConfig,
    db::{DbPool, Repository},
    errors::AppError,
    metrics,
    notify::DatabaseNotifier,
    services::{CommentService, NotificationService, RatingService, RecipeService},
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub recipes: RecipeService,
    pub comments: CommentService,
    pub ratings: RatingService,
    pub notifications: NotificationService,
    pub jwt: Arc<JwtManager>,
}

impl JwtState for AppState {
    fn jwt(&self) -> &JwtManager {
        &self.jwt
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    let config = Arc::new(config);

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!("Starting Tastebook API Gateway v{}", tastebook_common::VERSION);

    // Initialize metrics
    install_metrics_exporter(&config)?;
    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Wire up services
    let jwt_secret = config
        .auth
        .jwt_secret
        .clone()
        .ok_or_else(|| AppError::Configuration {
            message: "auth.jwt_secret is not set".to_string(),
        })?;
    let jwt = Arc::new(JwtManager::new(&jwt_secret, config.auth.jwt_expiration_secs));

    let repo = Repository::new(db.clone());
    let notifier = Arc::new(DatabaseNotifier::new(db.clone()));

    let state = AppState {
        config: config.clone(),
        db,
        recipes: RecipeService::new(repo.clone()),
        comments: CommentService::new(repo.clone(), notifier.clone()),
        ratings: RatingService::new(repo.clone(), notifier),
        notifications: NotificationService::new(repo),
        jwt,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Expose a Prometheus scrape endpoint on the configured metrics port
fn install_metrics_exporter(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .install()?;

    info!("Metrics exporter listening on {}", addr);
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Recipe endpoints
        .route("/recipes", get(handlers::recipes::list_recipes))
        .route("/recipes", post(handlers::recipes::create_recipe))
        .route("/recipes/{id}", get(handlers::recipes::get_recipe))
        .route("/recipes/{id}", put(handlers::recipes::update_recipe))
        .route("/recipes/{id}", delete(handlers::recipes::delete_recipe))
        .route("/recipes/slug/{slug}", get(handlers::recipes::get_recipe_by_slug))
        .route("/dashboard/recipes", get(handlers::recipes::dashboard_recipes))
        // Comment endpoints
        .route("/recipes/{id}/comments", get(handlers::comments::list_comments))
        .route("/comments", post(handlers::comments::create_comment))
        .route("/comments/{id}", delete(handlers::comments::delete_comment))
        // Rating endpoints
        .route("/ratings", post(handlers::ratings::rate_recipe))
        // Notification endpoints
        .route("/notifications", get(handlers::notifications::list_notifications))
        .route("/notifications/{id}/read", post(handlers::notifications::mark_read))
        .route("/notifications/read-all", post(handlers::notifications::mark_all_read));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Record request count and latency for every response
async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let tracker = metrics::RequestMetrics::start(&method, &path);
    let response = next.run(req).await;
    tracker.finish(response.status().as_u16());

    response
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
