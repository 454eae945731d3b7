//! Session intake listener
//!
//! Owns the session lifecycle the control plane consumes: clients connect
//! over TCP, introduce themselves with one `SessionHello` JSON line, and
//! then receive their session's outbound queue as newline-delimited JSON
//! until they disconnect. This is deliberately a line protocol, not a
//! tunnel transport; the data plane lives elsewhere.

use anyhow::Result;
use relaygate_control::{HookPipeline, Session, SessionRegistry};
use relaygate_proto::{ClientIdentity, SessionHello};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

pub struct IntakeListener {
    sessions: Arc<SessionRegistry>,
    hooks: Arc<HookPipeline>,
}

impl IntakeListener {
    pub fn new(sessions: Arc<SessionRegistry>, hooks: Arc<HookPipeline>) -> Self {
        Self { sessions, hooks }
    }

    /// Accept client sessions until the task is aborted
    pub async fn run(self: Arc<Self>, bind_addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(bind_addr).await?;
        info!("Session intake listening on {}", bind_addr);

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let intake = self.clone();
            tokio::spawn(async move {
                if let Err(e) = intake.handle_client(stream, peer_addr).await {
                    debug!(%peer_addr, error = %e, "intake connection ended with error");
                }
            });
        }
    }

    async fn handle_client(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        info!(%peer_addr, "client connected");
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        let Some(first_line) = lines.next_line().await? else {
            debug!(%peer_addr, "connection closed before hello");
            return Ok(());
        };

        let hello: SessionHello = match serde_json::from_str(&first_line) {
            Ok(hello) => hello,
            Err(e) => {
                warn!(%peer_addr, error = %e, "malformed session hello");
                write_half
                    .write_all(b"{\"error\":\"malformed session hello\"}\n")
                    .await?;
                return Ok(());
            }
        };

        let key = hello.key.clone();
        let identity = ClientIdentity {
            user: hello.user,
            run_id: hello
                .run_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            metas: hello.metas,
        };

        let (session, mut outbound) = Session::open(key.clone(), identity, self.hooks.clone());
        if let Err(e) = self.sessions.register(session) {
            warn!(%peer_addr, session = %key, error = %e, "refusing session");
            write_half
                .write_all(b"{\"error\":\"session key already in use\"}\n")
                .await?;
            return Ok(());
        }

        // Forward the outbound queue until the client goes away. The read
        // half only signals disconnect; clients have nothing else to say.
        let result: Result<()> = async {
            loop {
                tokio::select! {
                    msg = outbound.recv() => {
                        // The sender lives in the session entry, so the
                        // queue stays open until we unregister below.
                        let Some(msg) = msg else { break };
                        let mut line = serde_json::to_string(&msg)?;
                        line.push('\n');
                        write_half.write_all(line.as_bytes()).await?;
                    }
                    line = lines.next_line() => {
                        if line?.is_none() {
                            break;
                        }
                        // Ignore any further chatter from the client
                    }
                }
            }
            Ok(())
        }
        .await;

        self.sessions.unregister(&key);
        info!(%peer_addr, session = %key, "client disconnected");
        result
    }
}
