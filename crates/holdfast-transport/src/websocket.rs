//! WebSocket transport implementation using `tokio-tungstenite`.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr`. Port 0 picks a free port; see
    /// [`local_addr`](Self::local_addr).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(TransportError::io(ErrorKind::ConnectionRefused, e))
        })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "accepted WebSocket connection");

        let (sink, source) = ws.split();
        Ok(WebSocketConnection {
            id,
            peer,
            sink: Mutex::new(sink),
            source: Mutex::new(source),
        })
    }
}

/// A single WebSocket connection.
///
/// The stream is split so that a pending `recv` never blocks a `send`.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    source: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn send_message(&self, msg: Message) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| TransportError::SendFailed(TransportError::io(ErrorKind::BrokenPipe, e)))
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.send_message(Message::binary(data.to_vec())).await
    }

    async fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        self.send_message(Message::text(text.to_owned())).await
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut source = self.source.lock().await;
        loop {
            match source.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // tungstenite answers pings itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(TransportError::io(
                        ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::SendFailed(TransportError::io(ErrorKind::BrokenPipe, e)))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
