//! Room actor: an isolated Tokio task that owns one room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Player commands and timer fires are taken
//! off their channels one at a time and handed to the room's
//! [`RoundEngine`], so a room never sees two inputs at once.

use std::collections::HashMap;
use std::ops::ControlFlow;

use holdfast_protocol::{Phase, PlayerId, Recipient, RoomId, RoomSnapshot, ServerMessage};
use holdfast_timer::{TickPolicy, TimerToken, Timers};
use tokio::sync::{mpsc, oneshot};

use crate::config::MAX_PLAYERS;
use crate::{Input, Outcome, RoomConfig, RoomError, RoundEngine, TimerCommand};

/// Channel sender for delivering messages to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// A button action from a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Hold,
    Release,
}

/// Result of a successful leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    /// The player was the last occupant; the room actor has stopped.
    pub room_closed: bool,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },

    /// Fire-and-forget; invalid actions are dropped by the engine.
    Action {
        player_id: PlayerId,
        action: PlayerAction,
    },

    GetSnapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// Room metadata, without per-player detail.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: Phase,
    pub player_count: usize,
    pub max_players: usize,
    pub current_round: u32,
    pub max_rounds: u32,
}

/// Handle to a running room actor.
///
/// Cheap to clone; it's just an `mpsc::Sender` wrapper. The
/// `RoomManager` holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Asks the room to admit a player.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            name: name.into(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Removes a player from the room.
    pub async fn leave(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Delivers a hold or release (fire-and-forget).
    pub async fn send_action(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Action { player_id, action }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetSnapshot { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to stop. Outstanding timers are cancelled.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    engine: RoundEngine,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    timers: Timers,
    fired: mpsc::UnboundedReceiver<TimerToken>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    fn room_id(&self) -> RoomId {
        self.engine.room().id()
    }

    /// Runs the actor loop until shutdown or the room empties.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd).is_break() {
                        break;
                    }
                }
                Some(token) = self.fired.recv() => {
                    let outcome = self.engine.advance(Input::TimerFired(token));
                    self.apply(outcome);
                }
            }
        }

        self.timers.cancel_all();
        tracing::info!(room_id = %self.room_id(), "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> ControlFlow<()> {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => match self.engine.join(player_id, name) {
                Ok(outcome) => {
                    self.senders.insert(player_id, sender);
                    self.apply(outcome);
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    tracing::debug!(room_id = %self.room_id(), %player_id, error = %e, "join refused");
                    let _ = reply.send(Err(e));
                }
            },
            RoomCommand::Leave { player_id, reply } => {
                if self.engine.room().player(player_id).is_none() {
                    let _ = reply.send(Err(RoomError::NotInRoom(player_id)));
                    return ControlFlow::Continue(());
                }
                self.senders.remove(&player_id);
                let outcome = self.engine.advance(Input::Depart(player_id));
                let room_closed = outcome.room_closed;
                self.apply(outcome);
                let _ = reply.send(Ok(Departure { room_closed }));
                if room_closed {
                    return ControlFlow::Break(());
                }
            }
            RoomCommand::Action { player_id, action } => {
                let input = match action {
                    PlayerAction::Hold => Input::Hold(player_id),
                    PlayerAction::Release => Input::Release(player_id),
                };
                let outcome = self.engine.advance(input);
                self.apply(outcome);
            }
            RoomCommand::GetSnapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id(), "room shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Carries out timer commands, then delivers messages in order.
    fn apply(&mut self, outcome: Outcome) {
        for cmd in outcome.timers {
            match cmd {
                TimerCommand::Start { token, schedule } => self.timers.start(token, schedule),
                TimerCommand::Cancel(token) => {
                    self.timers.cancel(token);
                }
            }
        }
        self.dispatch(outcome.messages);
    }

    /// Sends messages to the right occupants, in join order.
    fn dispatch(&self, msgs: Vec<(Recipient, ServerMessage)>) {
        let players = self.engine.room().players();
        for (recipient, msg) in msgs {
            match recipient {
                Recipient::All => {
                    for p in players {
                        self.send_to(p.id, msg.clone());
                    }
                }
                Recipient::Player(pid) => self.send_to(pid, msg),
                Recipient::AllExcept(excluded) => {
                    for p in players.iter().filter(|p| p.id != excluded) {
                        self.send_to(p.id, msg.clone());
                    }
                }
            }
        }
    }

    /// Silently drops the message if the player's connection is gone.
    fn send_to(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        let room = self.engine.room();
        RoomInfo {
            room_id: room.id(),
            phase: room.phase(),
            player_count: room.players().len(),
            max_players: MAX_PLAYERS,
            current_round: room.current_round(),
            max_rounds: room.config().max_rounds,
        }
    }
}

/// Creates a room with `founder` in it and spawns its actor task.
///
/// `channel_size` bounds the command queue; senders wait when it fills.
pub(crate) fn spawn_room(
    room_id: RoomId,
    config: RoomConfig,
    founder: PlayerId,
    name: String,
    sender: PlayerSender,
    channel_size: usize,
) -> Result<RoomHandle, RoomError> {
    let (engine, outcome) = RoundEngine::create(room_id, config, founder, name)?;
    let (tx, rx) = mpsc::channel(channel_size);
    let (timers, fired) = Timers::new(TickPolicy::Skip);

    let mut actor = RoomActor {
        engine,
        senders: HashMap::from([(founder, sender)]),
        timers,
        fired,
        receiver: rx,
    };
    actor.apply(outcome);
    tokio::spawn(actor.run());

    Ok(RoomHandle {
        room_id,
        sender: tx,
    })
}
