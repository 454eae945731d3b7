//! Registration coordinator: the write path of the control plane
//!
//! Sequences a proxy submission end to end: session lookup, hook pipeline,
//! commit against the registration authority, directory insert, telemetry,
//! and asynchronous delivery of the outcome on the session's own queue.
//! The submitting caller never receives a synchronous result; failure is
//! observable only in logs and in the absence of a delivery.

use crate::authority::{CommitError, RegistrationAuthority};
use crate::hook::{HookContext, HookError};
use crate::proxy::{ActiveProxy, ProxyRegistry};
use crate::session::{Session, SessionRegistry};
use crate::stats::StatsStore;
use crate::status::{proxy_status_by_type, ProxyStatusInfo};
use chrono::Utc;
use relaygate_proto::{ProxyRequest, ProxyType, ServerMessage};
use std::sync::Arc;
use thiserror::Error;

/// Why a submission was aborted (logged, never surfaced to the caller)
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("commit failed: {0}")]
    Commit(#[from] CommitError),
}

/// Orchestrates proxy submissions against the shared directories
pub struct ProxyCoordinator {
    sessions: Arc<SessionRegistry>,
    proxies: Arc<ProxyRegistry>,
    authority: Arc<dyn RegistrationAuthority>,
    stats: Arc<dyn StatsStore>,
}

impl ProxyCoordinator {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        proxies: Arc<ProxyRegistry>,
        authority: Arc<dyn RegistrationAuthority>,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            sessions,
            proxies,
            authority,
            stats,
        }
    }

    pub fn proxies(&self) -> &ProxyRegistry {
        &self.proxies
    }

    /// Accept a submission for processing and return immediately
    ///
    /// The outcome reaches the client asynchronously on its session queue;
    /// there is no synchronous error path, by design.
    pub fn submit(self: &Arc<Self>, request: ProxyRequest) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.handle_new_proxy(request).await;
        });
    }

    /// Process one submission to completion
    ///
    /// This is `submit` without the detaching spawn; it holds no lock
    /// across the hook or commit awaits, so unrelated submissions never
    /// serialize behind it.
    pub async fn handle_new_proxy(&self, request: ProxyRequest) {
        let Some(session) = self.sessions.get(&request.client_key) else {
            // No session means no channel to answer on; drop silently.
            tracing::debug!(
                client_key = %request.client_key,
                proxy = %request.name,
                "no session for proxy submission, dropping"
            );
            return;
        };

        if let Err(e) = self.register(&session, request).await {
            tracing::warn!(session = %session.key(), error = %e, "proxy registration failed");
        }
    }

    async fn register(
        &self,
        session: &Session,
        request: ProxyRequest,
    ) -> Result<(), RegistrationError> {
        let ctx = HookContext {
            identity: session.identity().clone(),
            request,
        };
        let ctx = session.hooks().run(ctx).await?;

        let commit = self.authority.commit(&ctx.request).await?;
        let proxy_type = commit.config.proxy_type();

        self.proxies.insert(ActiveProxy {
            name: commit.name.clone(),
            proxy_type,
            config: commit.config.clone(),
            remote_addr: commit.remote_addr.clone(),
            started_at: Utc::now(),
        });
        self.stats.record_new_proxy(&commit.name, proxy_type);

        tracing::info!(
            session = %session.key(),
            proxy = %commit.name,
            remote_addr = %commit.remote_addr,
            "proxy registered"
        );

        // Best effort; the registration stands even if the client is gone.
        session.send(ServerMessage::ProxyRegistered {
            name: commit.name,
            remote_addr: commit.remote_addr,
            config: commit.config,
        });

        Ok(())
    }

    /// Status of all proxies of one type, configured and active joined
    pub fn proxies_by_type(&self, proxy_type: ProxyType) -> Vec<ProxyStatusInfo> {
        proxy_status_by_type(self.stats.as_ref(), &self.proxies, proxy_type)
    }
}
