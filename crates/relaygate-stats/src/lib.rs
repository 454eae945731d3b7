//! In-memory per-proxy traffic and connection counters
//!
//! Implements the control plane's `StatsStore` contract. Entries are keyed
//! by proxy name and deliberately outlive the proxy itself: a torn-down
//! proxy keeps its counters and close timestamp so status queries can
//! report it as Offline with history attached. Nothing here persists
//! across restarts.

use chrono::{DateTime, Utc};
use relaygate_control::StatsStore;
use relaygate_proto::{ProxyStatsSnapshot, ProxyType};

#[derive(Debug, Clone)]
struct ProxyStatsEntry {
    proxy_type: ProxyType,
    traffic_in: u64,
    traffic_out: u64,
    current_connections: u64,
    last_start_time: Option<DateTime<Utc>>,
    last_close_time: Option<DateTime<Utc>>,
}

/// Stats store holding everything in a concurrent map
pub struct MemoryStatsStore {
    proxies: dashmap::DashMap<String, ProxyStatsEntry>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self {
            proxies: dashmap::DashMap::new(),
        }
    }

    /// Mark a proxy as closed, keeping its counters
    pub fn record_close_proxy(&self, name: &str) {
        if let Some(mut entry) = self.proxies.get_mut(name) {
            entry.current_connections = 0;
            entry.last_close_time = Some(Utc::now());
        }
    }

    /// A user connection to the proxy opened
    pub fn open_connection(&self, name: &str) {
        if let Some(mut entry) = self.proxies.get_mut(name) {
            entry.current_connections += 1;
        }
    }

    /// A user connection to the proxy closed
    pub fn close_connection(&self, name: &str) {
        if let Some(mut entry) = self.proxies.get_mut(name) {
            entry.current_connections = entry.current_connections.saturating_sub(1);
        }
    }

    /// Bytes flowed from the public side toward the client
    pub fn add_traffic_in(&self, name: &str, bytes: u64) {
        if let Some(mut entry) = self.proxies.get_mut(name) {
            entry.traffic_in += bytes;
        }
    }

    /// Bytes flowed from the client toward the public side
    pub fn add_traffic_out(&self, name: &str, bytes: u64) {
        if let Some(mut entry) = self.proxies.get_mut(name) {
            entry.traffic_out += bytes;
        }
    }

    pub fn count(&self) -> usize {
        self.proxies.len()
    }
}

impl Default for MemoryStatsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsStore for MemoryStatsStore {
    fn record_new_proxy(&self, name: &str, proxy_type: ProxyType) {
        let mut entry = self
            .proxies
            .entry(name.to_string())
            .or_insert_with(|| ProxyStatsEntry {
                proxy_type,
                traffic_in: 0,
                traffic_out: 0,
                current_connections: 0,
                last_start_time: None,
                last_close_time: None,
            });
        // Re-registration keeps accumulated counters
        entry.proxy_type = proxy_type;
        entry.last_start_time = Some(Utc::now());
        tracing::debug!(proxy = %name, proxy_type = %proxy_type, "stats entry started");
    }

    fn snapshots_by_type(&self, proxy_type: ProxyType) -> Vec<ProxyStatsSnapshot> {
        self.proxies
            .iter()
            .filter(|entry| entry.value().proxy_type == proxy_type)
            .map(|entry| {
                let stats = entry.value();
                ProxyStatsSnapshot {
                    name: entry.key().clone(),
                    proxy_type: stats.proxy_type,
                    traffic_in: stats.traffic_in,
                    traffic_out: stats.traffic_out,
                    current_connections: stats.current_connections,
                    last_start_time: stats.last_start_time,
                    last_close_time: stats.last_close_time,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot_by_type() {
        let stats = MemoryStatsStore::new();
        stats.record_new_proxy("web1", ProxyType::Http);
        stats.record_new_proxy("db1", ProxyType::Tcp);

        let http = stats.snapshots_by_type(ProxyType::Http);
        assert_eq!(http.len(), 1);
        assert_eq!(http[0].name, "web1");
        assert!(http[0].last_start_time.is_some());
        assert!(http[0].last_close_time.is_none());

        assert!(stats.snapshots_by_type(ProxyType::Udp).is_empty());
    }

    #[test]
    fn test_traffic_and_connection_counters() {
        let stats = MemoryStatsStore::new();
        stats.record_new_proxy("web1", ProxyType::Http);

        stats.open_connection("web1");
        stats.open_connection("web1");
        stats.add_traffic_in("web1", 100);
        stats.add_traffic_out("web1", 250);
        stats.close_connection("web1");

        let snapshot = &stats.snapshots_by_type(ProxyType::Http)[0];
        assert_eq!(snapshot.current_connections, 1);
        assert_eq!(snapshot.traffic_in, 100);
        assert_eq!(snapshot.traffic_out, 250);
    }

    #[test]
    fn test_unknown_names_are_ignored() {
        let stats = MemoryStatsStore::new();

        stats.open_connection("ghost");
        stats.add_traffic_in("ghost", 10);
        stats.record_close_proxy("ghost");

        assert_eq!(stats.count(), 0);
    }

    #[test]
    fn test_close_keeps_entry_and_counters() {
        let stats = MemoryStatsStore::new();
        stats.record_new_proxy("web1", ProxyType::Http);
        stats.open_connection("web1");
        stats.add_traffic_in("web1", 42);

        stats.record_close_proxy("web1");

        let snapshot = &stats.snapshots_by_type(ProxyType::Http)[0];
        assert_eq!(snapshot.current_connections, 0);
        assert_eq!(snapshot.traffic_in, 42);
        assert!(snapshot.last_close_time.is_some());
    }

    #[test]
    fn test_reregistration_preserves_counters() {
        let stats = MemoryStatsStore::new();
        stats.record_new_proxy("web1", ProxyType::Http);
        stats.add_traffic_in("web1", 42);
        stats.record_close_proxy("web1");

        stats.record_new_proxy("web1", ProxyType::Http);

        let snapshot = &stats.snapshots_by_type(ProxyType::Http)[0];
        assert_eq!(snapshot.traffic_in, 42);
        assert!(snapshot.last_start_time.is_some());
    }
}
