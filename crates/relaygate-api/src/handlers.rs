use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use relaygate_proto::{ProxyRequest, ProxyType};

use crate::models::*;
use crate::AppState;

/// Register a new proxy endpoint
///
/// Accepted submissions are processed asynchronously; the outcome is
/// delivered on the owning client's session channel, never in this
/// response. A 202 only means the request was taken for processing.
#[utoipa::path(
    post,
    path = "/api/proxies",
    request_body = RegisterProxyRequest,
    responses(
        (status = 202, description = "Submission accepted for processing"),
        (status = 400, description = "Malformed proxy specification", body = ErrorResponse)
    ),
    tag = "proxies"
)]
pub async fn register_proxy(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterProxyRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    debug!(proxy = %body.name, proxy_type = %body.proxy_type, "proxy registration submitted");

    let request = ProxyRequest::try_from(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
                code: Some("INVALID_PROXY_REQUEST".to_string()),
            }),
        )
    })?;

    state.coordinator.submit(request);
    Ok(StatusCode::ACCEPTED)
}

/// List proxies of one type with live status
#[utoipa::path(
    get,
    path = "/api/proxies/{proxy_type}",
    params(
        ("proxy_type" = String, Path, description = "Proxy type: tcp, udp, http or https")
    ),
    responses(
        (status = 200, description = "Status of all proxies of this type", body = ProxyStatusList),
        (status = 400, description = "Unknown proxy type", body = ErrorResponse)
    ),
    tag = "proxies"
)]
pub async fn list_proxies_by_type(
    State(state): State<Arc<AppState>>,
    Path(proxy_type): Path<String>,
) -> Result<Json<ProxyStatusList>, (StatusCode, Json<ErrorResponse>)> {
    debug!(%proxy_type, "listing proxies");

    let proxy_type: ProxyType = proxy_type.parse().map_err(|e: relaygate_proto::ProxyTypeParseError| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
                code: Some("UNKNOWN_PROXY_TYPE".to_string()),
            }),
        )
    })?;

    let proxies: Vec<ProxyStatusEntry> = state
        .coordinator
        .proxies_by_type(proxy_type)
        .into_iter()
        .map(ProxyStatusEntry::from)
        .collect();
    let total = proxies.len();

    Ok(Json(ProxyStatusList { proxies, total }))
}

/// List connected client sessions
#[utoipa::path(
    get,
    path = "/api/clients",
    responses(
        (status = 200, description = "Connected sessions", body = SessionList)
    ),
    tag = "clients"
)]
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<SessionList> {
    let sessions: Vec<SessionInfo> = state
        .sessions
        .sessions()
        .iter()
        .map(|s| SessionInfo::from(s.as_ref()))
        .collect();
    let total = sessions.len();

    Json(SessionList { sessions, total })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions: state.sessions.count(),
        active_proxies: state.coordinator.proxies().count(),
    })
}
