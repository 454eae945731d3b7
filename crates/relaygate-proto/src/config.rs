//! Proxy type and type-specific configuration shapes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown proxy type string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown proxy type: {0}")]
pub struct ProxyTypeParseError(pub String);

/// Category of a proxy endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Tcp,
    Udp,
    Http,
    Https,
}

impl ProxyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyType::Tcp => "tcp",
            ProxyType::Udp => "udp",
            ProxyType::Http => "http",
            ProxyType::Https => "https",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyType {
    type Err = ProxyTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(ProxyType::Tcp),
            "udp" => Ok(ProxyType::Udp),
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            other => Err(ProxyTypeParseError(other.to_string())),
        }
    }
}

/// Type-specific proxy configuration
///
/// Tagged by the proxy type so the configuration travels as one value
/// through the hook pipeline, the commit and the status join.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProxyConfig {
    /// Raw TCP forwarding; `remote_port` 0 lets the authority pick one
    Tcp { remote_port: u16 },
    /// Raw UDP forwarding; `remote_port` 0 lets the authority pick one
    Udp { remote_port: u16 },
    /// HTTP vhost routing
    Http {
        #[serde(default)]
        custom_domains: Vec<String>,
        #[serde(default)]
        subdomain: Option<String>,
        #[serde(default)]
        locations: Vec<String>,
    },
    /// HTTPS vhost routing (SNI-based)
    Https {
        #[serde(default)]
        custom_domains: Vec<String>,
        #[serde(default)]
        subdomain: Option<String>,
    },
}

impl ProxyConfig {
    pub fn proxy_type(&self) -> ProxyType {
        match self {
            ProxyConfig::Tcp { .. } => ProxyType::Tcp,
            ProxyConfig::Udp { .. } => ProxyType::Udp,
            ProxyConfig::Http { .. } => ProxyType::Http,
            ProxyConfig::Https { .. } => ProxyType::Https,
        }
    }
}
