//! Per-proxy traffic snapshot, as produced by a stats store

use crate::config::ProxyType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time counters for one proxy, keyed by name
///
/// Snapshots outlive the proxy itself: a proxy that has been torn down
/// still shows up in its type's snapshot listing with its historical
/// counters, which is how status queries report Offline entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyStatsSnapshot {
    pub name: String,
    pub proxy_type: ProxyType,
    pub traffic_in: u64,
    pub traffic_out: u64,
    pub current_connections: u64,
    pub last_start_time: Option<DateTime<Utc>>,
    pub last_close_time: Option<DateTime<Utc>>,
}
