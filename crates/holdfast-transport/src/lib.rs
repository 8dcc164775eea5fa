//! Transport layer for Holdfast.
//!
//! Provides the [`Transport`] and [`Connection`] traits the server's
//! accept loop and connection handlers are written against, plus a
//! WebSocket implementation.
//!
//! A [`Connection`] can send and receive at the same time from different
//! tasks: a handler's reader loop awaits [`Connection::recv`] while its
//! writer task pushes room broadcasts through [`Connection::send_text`].
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive frames.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends a binary frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends a text frame.
    async fn send_text(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next data frame, text or binary.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
