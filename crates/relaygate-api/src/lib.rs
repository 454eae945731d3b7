//! Administrative HTTP surface for the relaygate control plane
//!
//! Thin transport layer over `relaygate-control`: route parsing, status
//! mapping and JSON encoding live here; all registration semantics stay in
//! the coordinator. Proxy submission is fire-and-forget end to end — the
//! HTTP caller gets a 202 and the real outcome travels on the client's
//! session channel.

pub mod handlers;
pub mod models;

use axum::{
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use relaygate_control::{ProxyCoordinator, SessionRegistry};

/// Application state shared across handlers
pub struct AppState {
    pub coordinator: Arc<ProxyCoordinator>,
    pub sessions: Arc<SessionRegistry>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Relaygate API",
        version = "0.1.0",
        description = "Administrative API for the relaygate reverse-tunnel relay",
        contact(
            name = "Relaygate Team",
            email = "team@relaygate.dev"
        )
    ),
    paths(
        handlers::register_proxy,
        handlers::list_proxies_by_type,
        handlers::list_clients,
        handlers::health_check,
    ),
    components(
        schemas(
            models::RegisterProxyRequest,
            models::ProxyConfigView,
            models::ProxyStatusEntry,
            models::ProxyStatusList,
            models::SessionInfo,
            models::SessionList,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "proxies", description = "Proxy registration and status endpoints"),
        (name = "clients", description = "Connected session endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable permissive CORS (for development dashboards)
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7400".parse().unwrap(),
            enable_cors: true,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(
        config: ApiServerConfig,
        coordinator: Arc<ProxyCoordinator>,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        let state = Arc::new(AppState {
            coordinator,
            sessions,
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let api_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/clients", get(handlers::list_clients))
            .route("/api/proxies", post(handlers::register_proxy))
            .route("/api/proxies/{proxy_type}", get(handlers::list_proxies_by_type))
            .with_state(self.state.clone());

        let mut router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(CorsLayer::permissive());
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

/// Convenience function to create and start an API server
pub async fn run_api_server(
    config: ApiServerConfig,
    coordinator: Arc<ProxyCoordinator>,
    sessions: Arc<SessionRegistry>,
) -> Result<(), anyhow::Error> {
    ApiServer::new(config, coordinator, sessions).start().await
}
