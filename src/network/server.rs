//! WebSocket Arena Server
//!
//! Async WebSocket gateway for spectator connections. Each connection
//! gets a reader loop and a writer task pumping a per-client outbox;
//! all arena logic lives in the session, the server only moves frames.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::network::protocol::{ClientMessage, ServerMessage, GatewayError, ErrorCode};
use crate::network::session::ArenaSession;

/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Constant literal, cannot fail to parse
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("default bind address"),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Build from the environment. `ARENA_BIND` overrides the bind
    /// address; an unparsable value falls back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(bind) = std::env::var("ARENA_BIND") {
            match bind.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => warn!(value = %bind, "ignoring unparsable ARENA_BIND"),
            }
        }
        config
    }
}

/// Arena server errors.
#[derive(Debug, thiserror::Error)]
pub enum ArenaServerError {
    /// Failed to bind to address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The arena gateway.
pub struct ArenaServer {
    config: ServerConfig,
    session: Arc<ArenaSession>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ArenaServer {
    /// Create a server over the given session.
    pub fn new(config: ServerConfig, session: Arc<ArenaSession>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            session,
            shutdown_tx,
        }
    }

    /// The arena session this server fronts.
    pub fn session(&self) -> &Arc<ArenaSession> {
        &self.session
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), ArenaServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("arena server listening on {}", self.config.bind_addr);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ArenaServerError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.session.client_count().await >= self.config.max_connections {
                                warn!("connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            debug!("new connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        self.session
            .broadcast(ServerMessage::Shutdown {
                reason: "server shutting down".to_string(),
            })
            .await;
        Ok(())
    }

    /// Signal the accept loop and all connections to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Number of connected clients.
    pub async fn connection_count(&self) -> usize {
        self.session.client_count().await
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let session = Arc::clone(&self.session);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("websocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);
            let client_id = session.register_client(msg_tx.clone()).await;

            // Writer task: drains the outbox onto the socket
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::Error(GatewayError {
                                            code: ErrorCode::InvalidMessage,
                                            message: "invalid message format".to_string(),
                                        })).await;
                                        continue;
                                    }
                                };
                                session.handle_message(client_id, client_msg).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                debug!("websocket error for {}: {}", addr, e);
                                break;
                            }
                            // Binary and transport ping/pong frames are ignored
                            Some(Ok(_)) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            sender_task.abort();
            session.unregister_client(client_id).await;
            debug!("client {} cleaned up", addr);
        });
    }
}

// =============================================================================
// TESTS
// =============================================================================
