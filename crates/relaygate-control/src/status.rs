//! Read-side join of configured vs. currently active proxies

use crate::proxy::ProxyRegistry;
use crate::stats::StatsStore;
use chrono::{DateTime, Utc};
use relaygate_proto::{ProxyConfig, ProxyType};

/// Whether a proxy known to the stats store is currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyStatus {
    Online,
    Offline,
}

/// One row of a status query, built fresh per call
#[derive(Debug, Clone)]
pub struct ProxyStatusInfo {
    pub name: String,
    pub proxy_type: ProxyType,
    pub status: ProxyStatus,
    /// Present only for online proxies
    pub config: Option<ProxyConfig>,
    /// Present only for online proxies
    pub remote_addr: Option<String>,
    pub traffic_in: u64,
    pub traffic_out: u64,
    pub current_connections: u64,
    pub last_start_time: Option<DateTime<Utc>>,
    pub last_close_time: Option<DateTime<Utc>>,
}

/// Join the stats store's snapshots for one type against the proxy directory
///
/// A snapshot whose name is active in the directory reports Online with its
/// current configuration attached; one that is absent reports Offline with
/// configuration fields omitted. An active entry whose recorded type does
/// not match the queried type is inconsistent and is skipped rather than
/// failing the batch. No snapshots means an empty result, never an error.
pub fn proxy_status_by_type(
    stats: &dyn StatsStore,
    proxies: &ProxyRegistry,
    proxy_type: ProxyType,
) -> Vec<ProxyStatusInfo> {
    let snapshots = stats.snapshots_by_type(proxy_type);
    let mut infos = Vec::with_capacity(snapshots.len());

    for snapshot in snapshots {
        let (status, config, remote_addr) = match proxies.get(&snapshot.name) {
            Some(proxy) => {
                if proxy.proxy_type != proxy_type {
                    tracing::warn!(
                        proxy = %snapshot.name,
                        recorded = %proxy.proxy_type,
                        queried = %proxy_type,
                        "active proxy type does not match stats category, skipping entry"
                    );
                    continue;
                }
                (ProxyStatus::Online, Some(proxy.config), Some(proxy.remote_addr))
            }
            None => (ProxyStatus::Offline, None, None),
        };

        infos.push(ProxyStatusInfo {
            name: snapshot.name,
            proxy_type: snapshot.proxy_type,
            status,
            config,
            remote_addr,
            traffic_in: snapshot.traffic_in,
            traffic_out: snapshot.traffic_out,
            current_connections: snapshot.current_connections,
            last_start_time: snapshot.last_start_time,
            last_close_time: snapshot.last_close_time,
        });
    }

    infos
}
