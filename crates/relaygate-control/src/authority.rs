//! Registration authority: the commit step of a proxy submission
//!
//! The authority is the sole arbiter of name conflicts between racing
//! submissions and owns whatever public-facing resource a proxy needs
//! (a listener port, a vhost). The control plane only consumes its
//! success/error contract.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use relaygate_proto::{ProxyCommit, ProxyConfig, ProxyRequest};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Mutex;
use thiserror::Error;

/// Reasons a commit can fail
#[derive(Error, Debug, Clone)]
pub enum CommitError {
    #[error("proxy name {0} is already in use")]
    NameInUse(String),

    #[error("requested port {0} is not available")]
    PortUnavailable(u16),

    #[error("no ports left in the allocation range")]
    PortsExhausted,

    #[error("commit rejected: {0}")]
    Rejected(String),
}

/// Allocates the public endpoint for a proxy request
#[async_trait]
pub trait RegistrationAuthority: Send + Sync {
    /// Commit a (hook-approved) request, yielding its public address
    ///
    /// Exactly one of two concurrent commits for the same name succeeds.
    async fn commit(&self, request: &ProxyRequest) -> Result<ProxyCommit, CommitError>;
}

/// Authority backed by a public host name and a TCP/UDP port range
///
/// TCP and UDP proxies get a port from the range (honoring a requested
/// port when it is free); HTTP and HTTPS proxies get a vhost address
/// derived from their first custom domain or `{subdomain-or-name}.{host}`.
pub struct PortRangeAuthority {
    public_host: String,
    port_range: RangeInclusive<u16>,
    /// Name reservations; the entry call is what arbitrates races
    bound: dashmap::DashMap<String, String>,
    used_ports: Mutex<HashSet<u16>>,
}

impl PortRangeAuthority {
    pub fn new(public_host: impl Into<String>, port_range: RangeInclusive<u16>) -> Self {
        Self {
            public_host: public_host.into(),
            port_range,
            bound: dashmap::DashMap::new(),
            used_ports: Mutex::new(HashSet::new()),
        }
    }

    /// Release a name reservation (and its port, if any) on teardown
    pub fn release(&self, name: &str) {
        if let Some((_, addr)) = self.bound.remove(name) {
            if let Some(port) = addr.rsplit(':').next().and_then(|p| p.parse::<u16>().ok()) {
                self.used_ports.lock().unwrap().remove(&port);
            }
            tracing::debug!(proxy = %name, %addr, "released endpoint");
        }
    }

    fn allocate_port(&self, requested: u16) -> Result<u16, CommitError> {
        let mut used = self.used_ports.lock().unwrap();
        if requested != 0 {
            if !self.port_range.contains(&requested) || !used.insert(requested) {
                return Err(CommitError::PortUnavailable(requested));
            }
            return Ok(requested);
        }
        for port in self.port_range.clone() {
            if used.insert(port) {
                return Ok(port);
            }
        }
        Err(CommitError::PortsExhausted)
    }

    fn vhost_addr(&self, name: &str, config: &ProxyConfig) -> String {
        let (scheme, custom_domains, subdomain) = match config {
            ProxyConfig::Http {
                custom_domains,
                subdomain,
                ..
            } => ("http", custom_domains, subdomain),
            ProxyConfig::Https {
                custom_domains,
                subdomain,
            } => ("https", custom_domains, subdomain),
            // Callers only pass vhost configs here
            _ => unreachable!("vhost address requested for a port-based proxy"),
        };

        let host = custom_domains
            .first()
            .cloned()
            .or_else(|| subdomain.clone().map(|s| format!("{}.{}", s, self.public_host)))
            .unwrap_or_else(|| format!("{}.{}", name, self.public_host));

        format!("{}://{}", scheme, host)
    }
}

#[async_trait]
impl RegistrationAuthority for PortRangeAuthority {
    async fn commit(&self, request: &ProxyRequest) -> Result<ProxyCommit, CommitError> {
        match self.bound.entry(request.name.clone()) {
            Entry::Occupied(_) => Err(CommitError::NameInUse(request.name.clone())),
            Entry::Vacant(entry) => {
                let (remote_addr, config) = match &request.config {
                    ProxyConfig::Tcp { remote_port } => {
                        let port = self.allocate_port(*remote_port)?;
                        (
                            format!("{}:{}", self.public_host, port),
                            ProxyConfig::Tcp { remote_port: port },
                        )
                    }
                    ProxyConfig::Udp { remote_port } => {
                        let port = self.allocate_port(*remote_port)?;
                        (
                            format!("{}:{}", self.public_host, port),
                            ProxyConfig::Udp { remote_port: port },
                        )
                    }
                    config @ (ProxyConfig::Http { .. } | ProxyConfig::Https { .. }) => (
                        self.vhost_addr(&request.name, config),
                        config.clone(),
                    ),
                };

                entry.insert(remote_addr.clone());
                tracing::debug!(proxy = %request.name, %remote_addr, "endpoint committed");
                Ok(ProxyCommit {
                    name: request.name.clone(),
                    remote_addr,
                    config,
                })
            }
        }
    }
}
