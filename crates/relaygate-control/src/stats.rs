//! Narrow contract for the external per-proxy stats store

use relaygate_proto::{ProxyStatsSnapshot, ProxyType};

/// Telemetry store keyed by proxy type and name
///
/// The control plane writes one event per successful registration and
/// reads snapshots for status queries; everything else about the store
/// (traffic accounting, retention) belongs to its implementation.
pub trait StatsStore: Send + Sync {
    /// Record that a proxy was (re)registered
    fn record_new_proxy(&self, name: &str, proxy_type: ProxyType);

    /// All snapshots for one proxy type, in the store's own order
    fn snapshots_by_type(&self, proxy_type: ProxyType) -> Vec<ProxyStatsSnapshot>;
}
