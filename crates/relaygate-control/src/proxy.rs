//! Directory of currently active proxies
//!
//! Entries appear only after a submission has passed the hook pipeline and
//! the registration authority's commit; they stay until explicit teardown
//! by the listener layer. Status queries join against this directory by
//! name and never hold a reference to an entry across calls.

use chrono::{DateTime, Utc};
use relaygate_proto::{ProxyConfig, ProxyType};

/// A committed, currently active proxy
#[derive(Debug, Clone)]
pub struct ActiveProxy {
    pub name: String,
    pub proxy_type: ProxyType,
    pub config: ProxyConfig,
    /// Public-facing address allocated at commit
    pub remote_addr: String,
    pub started_at: DateTime<Utc>,
}

/// Concurrent name-keyed registry of active proxies
pub struct ProxyRegistry {
    proxies: dashmap::DashMap<String, ActiveProxy>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self {
            proxies: dashmap::DashMap::new(),
        }
    }

    /// Record a committed proxy; the authority has already arbitrated names
    pub fn insert(&self, proxy: ActiveProxy) {
        tracing::debug!(proxy = %proxy.name, proxy_type = %proxy.proxy_type, "proxy activated");
        self.proxies.insert(proxy.name.clone(), proxy);
    }

    pub fn get(&self, name: &str) -> Option<ActiveProxy> {
        self.proxies.get(name).map(|entry| entry.value().clone())
    }

    /// Drop a proxy on teardown
    pub fn remove(&self, name: &str) -> Option<ActiveProxy> {
        let removed = self.proxies.remove(name).map(|(_, proxy)| proxy);
        if removed.is_some() {
            tracing::debug!(proxy = %name, "proxy deactivated");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.proxies.contains_key(name)
    }

    pub fn all(&self) -> Vec<ActiveProxy> {
        self.proxies
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.proxies.len()
    }
}

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
