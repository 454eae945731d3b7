//! Control-plane message and identity types

use crate::config::ProxyConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of an authenticated, connected client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClientIdentity {
    /// Account the client logged in as; may be empty for anonymous relays
    pub user: String,
    /// Unique id of this client run, assigned at login
    pub run_id: String,
    /// Free-form metadata supplied at login
    #[serde(default)]
    pub metas: HashMap<String, String>,
}

/// A request to expose a new proxy endpoint, bound to a client session
///
/// Built per administrative call; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyRequest {
    /// Proxy name, unique across the relay once committed
    pub name: String,
    /// Session key of the client that will serve this proxy
    pub client_key: String,
    /// Type-specific configuration
    pub config: ProxyConfig,
}

/// Outcome of a successful commit by the registration authority
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyCommit {
    /// Final proxy name (hooks may have rewritten the requested one)
    pub name: String,
    /// Public-facing address the proxy is reachable at
    pub remote_addr: String,
    /// Final configuration as committed
    pub config: ProxyConfig,
}

/// First message a client sends when opening a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionHello {
    /// Session key the client will be addressed by
    pub key: String,
    #[serde(default)]
    pub user: String,
    /// Run id; the session owner assigns one when absent
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub metas: HashMap<String, String>,
}

/// Messages delivered to a client on its session's outbound queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A proxy registration submitted on this session's behalf succeeded
    ProxyRegistered {
        name: String,
        remote_addr: String,
        config: ProxyConfig,
    },
    /// A previously active proxy was torn down
    ProxyClosed { name: String, reason: String },
    /// Keepalive echo from the relay
    Heartbeat { timestamp: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_tagged_by_kind() {
        let msg = ServerMessage::ProxyRegistered {
            name: "web1".to_string(),
            remote_addr: "relay.example.com:20001".to_string(),
            config: ProxyConfig::Tcp { remote_port: 20001 },
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "proxy_registered");
        assert_eq!(json["name"], "web1");

        let back: ServerMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_session_hello_minimal() {
        let hello: SessionHello = serde_json::from_str(r#"{"key":"K1"}"#).unwrap();
        assert_eq!(hello.key, "K1");
        assert!(hello.user.is_empty());
        assert!(hello.run_id.is_none());
        assert!(hello.metas.is_empty());
    }
}
