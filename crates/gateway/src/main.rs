//! Paperscope API Gateway
//!
//! The entry point for all external API requests.
//! Handles:
//! - User accounts and JWT authentication
//! - Encrypted storage of per-user Scopus API keys
//! - Proxying search, statistics and export to Scopus
//! - Wishlists
//! - Rate limiting and observability (logging, metrics)

mod handlers;
mod middleware;

use anyhow::Context;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use paperscope_common::{
    auth::JwtManager,
    cache::{Cache, CacheConfig},
    config::{AppConfig, ObservabilityConfig},
    crypto::CredentialCipher,
    db::DbPool,
    errors::{AppError, Result},
    metrics,
    scopus::{build_http_client, ScopusClient, SearchService},
    Repository,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{signal, sync::Notify};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub cache: Arc<Cache>,
    pub jwt: Arc<JwtManager>,
    pub cipher: CredentialCipher,
    /// Shared connection pool for outbound Scopus calls
    pub http: reqwest::Client,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn repo(&self) -> Repository {
        Repository::new(self.db.clone())
    }

    /// Search service bound to the user's first active Scopus key
    pub async fn search_service_for(&self, user_id: Uuid) -> Result<SearchService<ScopusClient>> {
        let key = self
            .repo()
            .find_active_api_key(user_id)
            .await?
            .ok_or(AppError::CredentialMissing)?;

        let api_key = self.cipher.decrypt(&key.encrypted_key)?;
        let client = ScopusClient::new(self.http.clone(), api_key, &self.config.scopus);

        Ok(SearchService::new(client).with_cache(self.cache.clone()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.observability);

    info!("Starting Paperscope API Gateway v{}", paperscope_common::VERSION);

    // Initialize metrics
    let recorder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("remote_call_duration_seconds".to_string()),
            metrics::REMOTE_LATENCY_BUCKETS,
        )?
        .install_recorder()?;
    metrics::register_metrics();

    let state = build_state(config, Some(recorder)).await?;
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port)
        .parse()
        .context("Invalid server address")?;
    let drain_timeout = state.config.shutdown_timeout();

    // Build the router
    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // In-flight requests get `drain_timeout` to finish once a signal arrives
    let stopping = Arc::new(Notify::new());
    let server = axum::serve(listener, app).with_graceful_shutdown({
        let stopping = stopping.clone();
        async move {
            shutdown_signal().await;
            stopping.notify_one();
        }
    });

    tokio::select! {
        result = server.into_future() => result?,
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(drain_timeout).await;
        } => warn!(timeout_secs = drain_timeout.as_secs(), "Graceful shutdown timed out"),
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Connect backing services and assemble the shared state
pub async fn build_state(config: AppConfig, recorder: Option<PrometheusHandle>) -> Result<AppState> {
    let jwt_secret = config
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::Configuration {
            message: "auth.jwt_secret is not set".to_string(),
        })?;
    let encryption_key = config
        .security
        .encryption_key
        .as_deref()
        .ok_or_else(|| AppError::Configuration {
            message: "security.encryption_key is not set".to_string(),
        })?;

    let jwt = Arc::new(JwtManager::new(jwt_secret, config.auth.jwt_expiration_secs));
    let cipher = CredentialCipher::new(encryption_key);
    let http = build_http_client(config.scopus_timeout())?;

    let db = DbPool::new(&config.database).await?;
    db.init_schema().await?;

    let cache = Arc::new(Cache::connect(CacheConfig::from(&config.redis)).await);
    info!(backend = cache.backend(), "Search cache ready");

    Ok(AppState {
        config: Arc::new(config),
        db,
        cache,
        jwt,
        cipher,
        http,
        metrics: recorder,
    })
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let api_routes = Router::new()
        // Accounts
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/auth/me",
            get(handlers::auth::me).delete(handlers::auth::delete_account),
        )
        // Scopus API keys
        .route(
            "/keys",
            post(handlers::api_keys::create_key).get(handlers::api_keys::list_keys),
        )
        .route("/keys/active", get(handlers::api_keys::active_key))
        .route("/keys/{id}", delete(handlers::api_keys::delete_key))
        .route("/keys/{id}/toggle", patch(handlers::api_keys::toggle_key))
        // Wishlist
        .route(
            "/wishlist",
            post(handlers::wishlist::add_item).get(handlers::wishlist::list_items),
        )
        .route("/wishlist/check/{eid}", get(handlers::wishlist::check_item))
        .route(
            "/wishlist/{id}",
            get(handlers::wishlist::get_item).delete(handlers::wishlist::delete_item),
        )
        .route("/wishlist/{id}/notes", patch(handlers::wishlist::update_notes))
        // Search
        .route("/search", post(handlers::search::search))
        .route("/search/cache", delete(handlers::search::clear_cache))
        .route("/quick-search", get(handlers::search::quick_search))
        .route("/highly-cited", get(handlers::search::highly_cited))
        .route("/stats", post(handlers::stats::stats))
        .route("/export/{format}", post(handlers::export::export))
        .route("/author/{name}", get(handlers::author::by_author))
        .route("/affiliation/{institution}", get(handlers::author::by_affiliation))
        // Download helpers
        .route("/pdf-link/{*doi}", get(handlers::download::pdf_link))
        .route("/download-info/{eid}", get(handlers::download::download_info));

    let api_routes = if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        api_routes.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ))
    } else {
        warn!("Rate limiting disabled");
        api_routes
    };

    let request_timeout = state.config.request_timeout();

    // Compose the app
    Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .route("/api", get(handlers::health::api_info))
        .nest("/api", api_routes)
        .route_layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
