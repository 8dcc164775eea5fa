//! `HoldfastServer` builder and accept loop.
//!
//! This is the entry point for running a Holdfast server. It ties
//! together the layers: transport → protocol → room.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use holdfast_protocol::JsonCodec;
use holdfast_room::RoomManager;
use holdfast_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{HoldfastError, ServerConfig};

/// Shared server state passed to each connection task.
pub(crate) struct ServerState {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
    /// Envelope timestamps count from here.
    pub(crate) started: Instant,
}

impl ServerState {
    /// Milliseconds since the server started.
    pub(crate) fn clock(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Holdfast server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use holdfast::HoldfastServer;
///
/// # async fn start() -> Result<(), holdfast::HoldfastError> {
/// let server = HoldfastServer::builder()
///     .bind("0.0.0.0:8080")
///     .idle_timeout(Duration::from_secs(60))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct HoldfastServerBuilder {
    config: ServerConfig,
}

impl HoldfastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting at once, e.g. with [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn hello_timeout(mut self, timeout: Duration) -> Self {
        self.config.hello_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the command queue depth of each room actor.
    pub fn room_mailbox(mut self, size: usize) -> Self {
        self.config.room_mailbox = size;
        self
    }

    /// Binds the listener. Connections are not accepted until
    /// [`HoldfastServer::run`].
    pub async fn build(self) -> Result<HoldfastServer, HoldfastError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::with_channel_size(self.config.room_mailbox)),
            codec: JsonCodec,
            config: self.config,
            started: Instant::now(),
        });

        Ok(HoldfastServer { transport, state })
    }
}

/// A bound Holdfast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct HoldfastServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl HoldfastServer {
    pub fn builder() -> HoldfastServerBuilder {
        HoldfastServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    ///
    /// Only returns if the future is dropped; accept failures are logged
    /// and the loop carries on.
    pub async fn run(mut self) -> Result<(), HoldfastError> {
        tracing::info!(
            addr = %self.state.config.bind_addr,
            "Holdfast server running"
        );

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
