//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the route table
//! - Wrap it in the request pipeline, in a fixed order
//! - Wire ambient layers (tracing, request ID, body limit, timeout)
//! - Serve with graceful shutdown and run the rate limit sweeper

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderName;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Environment, ServiceConfig};
use crate::http::handlers;
use crate::http::middleware::{authenticate, cors, rate_limit, recover_panic, track_requests};
use crate::lifecycle::Shutdown;
use crate::observability::RequestStats;
use crate::security::{RateLimiter, TokenCodec};
use crate::users::{UserService, UserStore};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Static facts reported by the health and debug endpoints.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub environment: Environment,
    pub version: &'static str,
    pub started: Instant,
}

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub limiter: Arc<RateLimiter>,
    pub stats: Arc<RequestStats>,
    pub trusted_origins: Arc<Vec<String>>,
    pub info: Arc<ServiceInfo>,
}

impl AppState {
    pub fn new(config: &ServiceConfig, store: Arc<dyn UserStore>) -> Self {
        Self {
            users: UserService::new(store, TokenCodec::new(&config.auth.secret)),
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
            stats: Arc::new(RequestStats::new()),
            trusted_origins: Arc::new(config.cors.trusted_origins.clone()),
            info: Arc::new(ServiceInfo {
                environment: config.environment,
                version: env!("CARGO_PKG_VERSION"),
                started: Instant::now(),
            }),
        }
    }
}

/// The route table, before any pipeline stage is applied.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/service/users/health", get(handlers::health))
        .route("/service/users", post(handlers::register))
        .route("/service/users/authentication", post(handlers::authenticate))
        .route("/service/users/me", get(handlers::me))
        .route("/service/users/{id}", patch(handlers::update))
        .route("/debug/vars", get(handlers::debug_vars))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
}

/// Wrap `router` in the request pipeline.
///
/// Outermost first: metrics → panic recovery → CORS → rate limit →
/// authentication → dispatch. `Router::layer` wraps what is already
/// there, so the stages are added innermost first.
pub fn pipeline(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), cors))
        .layer(from_fn(recover_panic))
        .layer(from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

/// HTTP server for the user service.
pub struct HttpServer {
    router: Router,
    state: AppState,
    config: ServiceConfig,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, store: Arc<dyn UserStore>) -> Self {
        let state = AppState::new(&config, store);
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            state,
            config,
        }
    }

    /// Pipeline plus the ambient layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        pipeline(routes(), state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests
    /// for at most the configured shutdown window.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            limiter_enabled = self.state.limiter.is_enabled(),
            "HTTP server starting"
        );

        let sweeper = tokio::spawn(self.state.limiter.clone().run_sweeper(shutdown.subscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.signalled())
            .into_future();

        let drain = Duration::from_secs(self.config.timeouts.shutdown_secs);
        let deadline = shutdown.signalled();
        tokio::select! {
            result = server => result?,
            _ = async move {
                deadline.await;
                tokio::time::sleep(drain).await;
            } => {
                tracing::warn!(drain = ?drain, "Shutdown window elapsed, dropping open connections");
            }
        }

        let _ = sweeper.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
