//! Control plane for proxy registration and session correlation
//!
//! This crate turns stateless administrative requests into session-scoped
//! proxy registrations: it resolves the submitting client's live session,
//! runs the request through that session's hook pipeline, commits it against
//! a registration authority and delivers the outcome back on the session's
//! own outbound queue. It also provides the read-side join that reconciles
//! configured proxies with currently active ones for status reporting.

pub mod authority;
pub mod coordinator;
pub mod hook;
pub mod proxy;
pub mod session;
pub mod stats;
pub mod status;

pub use authority::{CommitError, PortRangeAuthority, RegistrationAuthority};
pub use coordinator::{ProxyCoordinator, RegistrationError};
pub use hook::{HookContext, HookError, HookPipeline, ProxyNamePolicy, RegistrationHook, UserScopedNames};
pub use proxy::{ActiveProxy, ProxyRegistry};
pub use session::{Session, SessionError, SessionRegistry, OUTBOUND_QUEUE_DEPTH};
pub use stats::StatsStore;
pub use status::{proxy_status_by_type, ProxyStatus, ProxyStatusInfo};
