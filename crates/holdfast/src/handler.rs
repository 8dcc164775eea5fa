//! Per-connection handler: handshake and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that owns the outbound side
//!   2. Receive `Hello` → validate version → send `Welcome`
//!   3. Loop: receive envelopes → route to the room manager
//!   4. Leave any room, let the writer drain, close the socket
//!
//! Everything the client receives, direct replies and room broadcasts
//! alike, goes through one unbounded channel to the writer, which is
//! the only place envelopes are numbered.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use holdfast_protocol::{
    ClientMessage, Codec, Envelope, ErrorCode, PROTOCOL_VERSION, PlayerId, ProtocolError,
    ServerMessage,
};
use holdfast_room::{PlayerAction, PlayerSender, RoomConfig, RoomError};
use holdfast_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::HoldfastError;
use crate::server::ServerState;

/// Longest display name, in characters.
const MAX_NAME_LEN: usize = 24;

/// How long queued messages get to flush once the connection is ending.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Drop guard that removes the player from their room if the handler
/// exits without doing so itself (early return or panic).
///
/// `Drop` is synchronous, so the async removal runs in a spawned task.
struct DisconnectGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
    armed: bool,
}

impl DisconnectGuard {
    fn new(player_id: PlayerId, state: Arc<ServerState>) -> Self {
        Self {
            player_id,
            state,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.lock().await.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), HoldfastError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let mut writer = spawn_writer(Arc::clone(&conn), Arc::clone(&state), rx);

    let result = match perform_handshake(&conn, &state, player_id, &tx).await {
        Ok(()) => {
            tracing::info!(%conn_id, %player_id, "player connected");
            let mut guard = DisconnectGuard::new(player_id, Arc::clone(&state));

            message_loop(&conn, &state, player_id, &tx).await;

            // The room holds a clone of `tx`; the writer can't finish
            // until the player is out of it.
            state.rooms.lock().await.disconnect(player_id).await;
            guard.disarm();
            tracing::info!(%player_id, "player disconnected");
            Ok(())
        }
        Err(e) => Err(e),
    };

    drop(tx);
    if tokio::time::timeout(DRAIN_TIMEOUT, &mut writer).await.is_err() {
        tracing::debug!(%conn_id, "writer did not drain in time");
        writer.abort();
    }
    let _ = conn.close().await;
    result
}

/// Spawns the task that numbers, encodes, and sends outbound messages.
///
/// Ends once every sender is dropped and the queue is empty, or when the
/// socket stops accepting writes.
fn spawn_writer(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut seq: u64 = 1;
        while let Some(payload) = rx.recv().await {
            let envelope = Envelope {
                seq: next_seq(&mut seq),
                timestamp: state.clock(),
                payload,
            };
            let bytes = match state.codec.encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(conn_id = %conn.id(), error = %e, "failed to encode envelope");
                    continue;
                }
            };
            let sent = match std::str::from_utf8(&bytes) {
                Ok(text) => conn.send_text(text).await,
                Err(_) => conn.send(&bytes).await,
            };
            if let Err(e) = sent {
                tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, writer stopping");
                break;
            }
        }
    })
}

/// Waits for `Hello`, checks the version, and answers with `Welcome`.
///
/// On failure an `Error` has already been queued for the client.
async fn perform_handshake(
    conn: &WebSocketConnection,
    state: &ServerState,
    player_id: PlayerId,
    tx: &PlayerSender,
) -> Result<(), HoldfastError> {
    let data = match tokio::time::timeout(state.config.hello_timeout, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before Hello".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("Hello timed out".into()).into());
        }
    };

    let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
        Ok(envelope) => envelope,
        Err(e) => {
            reply_error(tx, ErrorCode::InvalidMessage, e.to_string());
            return Err(e.into());
        }
    };

    let version = match envelope.payload {
        ClientMessage::Hello { version } => version,
        _ => {
            reply_error(tx, ErrorCode::InvalidMessage, "expected Hello");
            return Err(
                ProtocolError::InvalidMessage("first message must be Hello".into()).into(),
            );
        }
    };

    if version != PROTOCOL_VERSION {
        reply_error(
            tx,
            ErrorCode::UnsupportedVersion,
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        );
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let _ = tx.send(ServerMessage::Welcome {
        player_id,
        server_time: state.clock(),
    });
    Ok(())
}

/// Reads frames until the client leaves, goes quiet, or says goodbye.
async fn message_loop(
    conn: &WebSocketConnection,
    state: &ServerState,
    player_id: PlayerId,
    tx: &PlayerSender,
) {
    loop {
        let data = match tokio::time::timeout(state.config.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection idle, dropping");
                break;
            }
        };

        let envelope: Envelope<ClientMessage> = match state.codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                reply_error(tx, ErrorCode::InvalidMessage, e.to_string());
                continue;
            }
        };

        if handle_message(state, player_id, envelope.payload, tx)
            .await
            .is_break()
        {
            break;
        }
    }
}

/// Routes one client message. `Break` means the client is done.
async fn handle_message(
    state: &ServerState,
    player_id: PlayerId,
    msg: ClientMessage,
    tx: &PlayerSender,
) -> ControlFlow<()> {
    match msg {
        ClientMessage::Hello { .. } => {
            reply_error(tx, ErrorCode::InvalidMessage, "already greeted");
        }

        ClientMessage::CreateRoom {
            name,
            initial_time,
            max_rounds,
        } => {
            let name = match display_name(&name) {
                Ok(name) => name,
                Err(reason) => {
                    reply_error(tx, ErrorCode::InvalidMessage, reason);
                    return ControlFlow::Continue(());
                }
            };
            let config = RoomConfig::new(initial_time, max_rounds);
            // RoomJoined comes from the room itself, through `tx`.
            let result = state
                .rooms
                .lock()
                .await
                .create_room(player_id, name, config, tx.clone());
            if let Err(e) = result {
                tracing::debug!(%player_id, error = %e, "create room refused");
                reply_room_error(tx, &e);
            }
        }

        ClientMessage::JoinRoom { room_id, name } => {
            let name = match display_name(&name) {
                Ok(name) => name,
                Err(reason) => {
                    reply_error(tx, ErrorCode::InvalidMessage, reason);
                    return ControlFlow::Continue(());
                }
            };
            let result = state
                .rooms
                .lock()
                .await
                .join_room(player_id, room_id, name, tx.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%player_id, %room_id, error = %e, "join refused");
                reply_room_error(tx, &e);
            }
        }

        ClientMessage::LeaveRoom => {
            let result = state.rooms.lock().await.leave_room(player_id).await;
            match result {
                Ok(room_id) => {
                    let _ = tx.send(ServerMessage::RoomLeft { room_id });
                }
                Err(e) => reply_room_error(tx, &e),
            }
        }

        ClientMessage::Hold => {
            route_action(state, player_id, PlayerAction::Hold, tx).await;
        }
        ClientMessage::Release => {
            route_action(state, player_id, PlayerAction::Release, tx).await;
        }

        ClientMessage::Heartbeat { client_time } => {
            let _ = tx.send(ServerMessage::HeartbeatAck {
                client_time,
                server_time: state.clock(),
            });
        }

        ClientMessage::Goodbye { reason } => {
            tracing::info!(%player_id, %reason, "client said goodbye");
            return ControlFlow::Break(());
        }
    }

    ControlFlow::Continue(())
}

/// Button presses outside a room are dropped quietly, like presses the
/// room itself ignores.
async fn route_action(
    state: &ServerState,
    player_id: PlayerId,
    action: PlayerAction,
    tx: &PlayerSender,
) {
    let result = state.rooms.lock().await.route_action(player_id, action).await;
    match result {
        Ok(()) => {}
        Err(RoomError::NotInRoom(_)) => {
            tracing::debug!(%player_id, ?action, "action outside a room ignored");
        }
        Err(e) => reply_room_error(tx, &e),
    }
}

/// Trims `raw` and checks it is a usable display name.
fn display_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("name must be at most {MAX_NAME_LEN} characters"));
    }
    Ok(name.to_string())
}

fn reply_error(tx: &PlayerSender, code: ErrorCode, message: impl Into<String>) {
    let _ = tx.send(ServerMessage::Error {
        code,
        message: message.into(),
    });
}

fn reply_room_error(tx: &PlayerSender, err: &RoomError) {
    reply_error(tx, err.code(), err.to_string());
}

/// Returns the current sequence number and advances it.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
