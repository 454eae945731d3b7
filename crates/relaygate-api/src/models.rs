//! Wire models for the administrative API
//!
//! The registration request is deliberately flat (one struct, type-specific
//! fields optional) to match the administrative wire shape; conversion into
//! the typed control-plane request is where validation happens.

use chrono::{DateTime, Utc};
use relaygate_control::{ProxyStatusInfo, Session};
use relaygate_proto::{ProxyConfig, ProxyRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Error payload for any non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Rejected registration payloads
#[derive(Error, Debug, Clone)]
pub enum InvalidProxyRequest {
    #[error("unknown proxy type: {0}")]
    UnknownType(String),

    #[error("proxy name is required")]
    MissingName,

    #[error("client_key is required")]
    MissingClientKey,
}

/// Request body for registering a new proxy
///
/// `proxy_type` selects which of the optional fields apply; the rest are
/// ignored. Port 0 (or omitted) asks the relay to pick one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterProxyRequest {
    /// Proxy name, unique once committed
    pub name: String,
    /// One of: tcp, udp, http, https
    pub proxy_type: String,
    /// Session key of the serving client
    pub client_key: String,
    /// Public port to request (tcp/udp)
    #[serde(default)]
    pub remote_port: Option<u16>,
    /// Custom domains to answer on (http/https)
    #[serde(default)]
    pub custom_domains: Vec<String>,
    /// Subdomain under the relay's public host (http/https)
    #[serde(default)]
    pub subdomain: Option<String>,
    /// Path prefixes to route (http)
    #[serde(default)]
    pub locations: Vec<String>,
}

impl TryFrom<RegisterProxyRequest> for ProxyRequest {
    type Error = InvalidProxyRequest;

    fn try_from(body: RegisterProxyRequest) -> Result<Self, Self::Error> {
        if body.name.is_empty() {
            return Err(InvalidProxyRequest::MissingName);
        }
        if body.client_key.is_empty() {
            return Err(InvalidProxyRequest::MissingClientKey);
        }

        let config = match body.proxy_type.as_str() {
            "tcp" => ProxyConfig::Tcp {
                remote_port: body.remote_port.unwrap_or(0),
            },
            "udp" => ProxyConfig::Udp {
                remote_port: body.remote_port.unwrap_or(0),
            },
            "http" => ProxyConfig::Http {
                custom_domains: body.custom_domains,
                subdomain: body.subdomain,
                locations: body.locations,
            },
            "https" => ProxyConfig::Https {
                custom_domains: body.custom_domains,
                subdomain: body.subdomain,
            },
            other => return Err(InvalidProxyRequest::UnknownType(other.to_string())),
        };

        Ok(ProxyRequest {
            name: body.name,
            client_key: body.client_key,
            config,
        })
    }
}

/// Type-specific configuration attached to online status entries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProxyConfigView {
    Tcp {
        remote_port: u16,
    },
    Udp {
        remote_port: u16,
    },
    Http {
        custom_domains: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        subdomain: Option<String>,
        locations: Vec<String>,
    },
    Https {
        custom_domains: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        subdomain: Option<String>,
    },
}

impl From<ProxyConfig> for ProxyConfigView {
    fn from(config: ProxyConfig) -> Self {
        match config {
            ProxyConfig::Tcp { remote_port } => ProxyConfigView::Tcp { remote_port },
            ProxyConfig::Udp { remote_port } => ProxyConfigView::Udp { remote_port },
            ProxyConfig::Http {
                custom_domains,
                subdomain,
                locations,
            } => ProxyConfigView::Http {
                custom_domains,
                subdomain,
                locations,
            },
            ProxyConfig::Https {
                custom_domains,
                subdomain,
            } => ProxyConfigView::Https {
                custom_domains,
                subdomain,
            },
        }
    }
}

/// One proxy in a status listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProxyStatusEntry {
    pub name: String,
    pub proxy_type: String,
    /// "online" or "offline"
    pub status: String,
    /// Current configuration; present only when online
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ProxyConfigView>,
    /// Public address; present only when online
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
    pub traffic_in: u64,
    pub traffic_out: u64,
    pub current_connections: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_close_time: Option<DateTime<Utc>>,
}

impl From<ProxyStatusInfo> for ProxyStatusEntry {
    fn from(info: ProxyStatusInfo) -> Self {
        Self {
            name: info.name,
            proxy_type: info.proxy_type.to_string(),
            status: match info.status {
                relaygate_control::ProxyStatus::Online => "online".to_string(),
                relaygate_control::ProxyStatus::Offline => "offline".to_string(),
            },
            config: info.config.map(ProxyConfigView::from),
            remote_addr: info.remote_addr,
            traffic_in: info.traffic_in,
            traffic_out: info.traffic_out,
            current_connections: info.current_connections,
            last_start_time: info.last_start_time,
            last_close_time: info.last_close_time,
        }
    }
}

/// Status listing for one proxy type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProxyStatusList {
    pub proxies: Vec<ProxyStatusEntry>,
    pub total: usize,
}

/// Identity summary of one connected session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionInfo {
    pub user: String,
    pub run_id: String,
    pub meta_count: usize,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        let identity = session.identity();
        Self {
            user: identity.user.clone(),
            run_id: identity.run_id.clone(),
            meta_count: identity.metas.len(),
        }
    }
}

/// Listing of connected sessions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionList {
    pub sessions: Vec<SessionInfo>,
    pub total: usize,
}

/// Service health summary
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
    pub active_proxies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(proxy_type: &str) -> RegisterProxyRequest {
        RegisterProxyRequest {
            name: "web1".to_string(),
            proxy_type: proxy_type.to_string(),
            client_key: "K1".to_string(),
            remote_port: None,
            custom_domains: vec![],
            subdomain: None,
            locations: vec![],
        }
    }

    #[test]
    fn test_tcp_conversion_defaults_port() {
        let request = ProxyRequest::try_from(body("tcp")).unwrap();
        assert_eq!(request.config, ProxyConfig::Tcp { remote_port: 0 });
    }

    #[test]
    fn test_http_conversion_carries_vhost_fields() {
        let mut raw = body("http");
        raw.custom_domains = vec!["app.example.com".to_string()];
        raw.subdomain = Some("app".to_string());

        let request = ProxyRequest::try_from(raw).unwrap();
        let ProxyConfig::Http {
            custom_domains,
            subdomain,
            ..
        } = request.config
        else {
            panic!("expected http config");
        };
        assert_eq!(custom_domains, vec!["app.example.com"]);
        assert_eq!(subdomain.as_deref(), Some("app"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = ProxyRequest::try_from(body("stcp")).unwrap_err();
        assert!(matches!(err, InvalidProxyRequest::UnknownType(ty) if ty == "stcp"));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut raw = body("tcp");
        raw.name = String::new();
        assert!(matches!(
            ProxyRequest::try_from(raw).unwrap_err(),
            InvalidProxyRequest::MissingName
        ));

        let mut raw = body("tcp");
        raw.client_key = String::new();
        assert!(matches!(
            ProxyRequest::try_from(raw).unwrap_err(),
            InvalidProxyRequest::MissingClientKey
        ));
    }
}
