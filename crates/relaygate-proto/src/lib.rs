//! Shared data types for the relaygate control plane
//!
//! Everything here is plain serde-serializable data: proxy configuration
//! shapes, client identity, the messages a session can receive on its
//! outbound queue, and per-proxy traffic snapshots. No behavior beyond
//! accessors and parsing lives in this crate.

pub mod config;
pub mod messages;
pub mod stats;

pub use config::{ProxyConfig, ProxyType, ProxyTypeParseError};
pub use messages::{ClientIdentity, ProxyCommit, ProxyRequest, ServerMessage, SessionHello};
pub use stats::ProxyStatsSnapshot;
