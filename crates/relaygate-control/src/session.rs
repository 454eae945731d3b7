//! Live client sessions and the session directory
//!
//! A session is the relay-side handle for one connected, authenticated
//! client: its identity, its hook pipeline and the outbound queue that is
//! the only way the control plane talks back to it. The directory maps
//! session keys to sessions and is safe to read while the connection layer
//! adds and removes entries concurrently.

use crate::hook::HookPipeline;
use dashmap::mapref::entry::Entry;
use relaygate_proto::{ClientIdentity, ServerMessage};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Depth of a session's outbound queue
///
/// The coordinator never blocks on delivery; once the consumer falls this
/// far behind, further messages are dropped and logged.
pub const OUTBOUND_QUEUE_DEPTH: usize = 64;

/// Errors from session directory operations
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    #[error("session key {0} is already registered")]
    AlreadyRegistered(String),
}

/// One connected client's live session
pub struct Session {
    key: String,
    identity: ClientIdentity,
    outbound: mpsc::Sender<ServerMessage>,
    hooks: Arc<HookPipeline>,
}

impl Session {
    /// Create a session and hand back the consumer end of its outbound queue
    ///
    /// The receiver belongs to the session's write path (the connection
    /// layer); everything else in the control plane only ever enqueues.
    pub fn open(
        key: String,
        identity: ClientIdentity,
        hooks: Arc<HookPipeline>,
    ) -> (Arc<Self>, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let session = Arc::new(Self {
            key,
            identity,
            outbound: tx,
            hooks,
        });
        (session, rx)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn hooks(&self) -> &HookPipeline {
        &self.hooks
    }

    /// Enqueue a message for this session, never blocking
    ///
    /// Returns `false` when the message was dropped because the queue is
    /// saturated or the client already disconnected. Callers treat a drop
    /// as non-fatal; whatever the message reported already happened.
    pub fn send(&self, msg: ServerMessage) -> bool {
        match self.outbound.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::warn!(
                    session = %self.key,
                    ?msg,
                    "outbound queue full, dropping message"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                tracing::debug!(
                    session = %self.key,
                    ?msg,
                    "session disconnected, dropping message"
                );
                false
            }
        }
    }
}

/// Directory of live sessions keyed by session key
///
/// A key maps to at most one session. A lookup may race a disconnect and
/// return `None`; callers owe no response in that case.
pub struct SessionRegistry {
    sessions: dashmap::DashMap<String, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: dashmap::DashMap::new(),
        }
    }

    /// Register a session under its key, failing on a duplicate
    pub fn register(&self, session: Arc<Session>) -> Result<(), SessionError> {
        match self.sessions.entry(session.key().to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!(session = %session.key(), "rejecting duplicate session key");
                Err(SessionError::AlreadyRegistered(session.key().to_string()))
            }
            Entry::Vacant(entry) => {
                tracing::info!(
                    session = %session.key(),
                    user = %session.identity().user,
                    run_id = %session.identity().run_id,
                    "session registered"
                );
                entry.insert(session);
                Ok(())
            }
        }
    }

    /// Remove a session on disconnect
    pub fn unregister(&self, key: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(key).map(|(_, s)| s);
        if removed.is_some() {
            tracing::info!(session = %key, "session unregistered");
        }
        removed
    }

    /// Look up a session by key
    pub fn get(&self, key: &str) -> Option<Arc<Session>> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    /// All currently connected sessions
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
