//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;

use holdfast_protocol::{PlayerId, RoomId, RoomSnapshot};
use rand::Rng;

use crate::actor::spawn_room;
use crate::{Departure, PlayerAction, PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Room codes are six digits, so they never start with a zero.
const ROOM_CODE_MIN: u32 = 100_000;
const ROOM_CODE_MAX: u32 = 999_999;

/// Manages all live rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from the connection
/// handlers.
pub struct RoomManager {
    /// Live rooms, keyed by room code.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time.
    player_rooms: HashMap<PlayerId, RoomId>,

    channel_size: usize,
}

impl RoomManager {
    pub fn new() -> Self {
        Self::with_channel_size(DEFAULT_CHANNEL_SIZE)
    }

    /// Creates a manager whose room actors queue up to `channel_size`
    /// commands each.
    pub fn with_channel_size(channel_size: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            channel_size: channel_size.max(1),
        }
    }

    /// Creates a room with `founder` as its first occupant and returns
    /// its code. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if the founder is in a room already
    /// - [`RoomError::InvalidConfig`] if the settings are out of range;
    ///   nothing is registered
    pub fn create_room(
        &mut self,
        founder: PlayerId,
        name: impl Into<String>,
        config: RoomConfig,
        sender: PlayerSender,
    ) -> Result<RoomId, RoomError> {
        if let Some(current) = self.player_rooms.get(&founder) {
            return Err(RoomError::AlreadyInRoom(founder, *current));
        }
        config.validate()?;

        let room_id = self.generate_room_id();
        let handle = spawn_room(
            room_id,
            config,
            founder,
            name.into(),
            sender,
            self.channel_size,
        )?;
        self.rooms.insert(room_id, handle);
        self.player_rooms.insert(founder, room_id);
        tracing::info!(%room_id, %founder, rooms = self.rooms.len(), "room registered");
        Ok(room_id)
    }

    /// Returns a handle to a live room.
    pub fn get_room(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&room_id).cloned()
    }

    /// Shuts a room down and forgets everyone in it.
    pub async fn remove_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room removed");
        Ok(())
    }

    /// Adds a player to a room.
    ///
    /// Enforces the "one room at a time" invariant.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::NotFound(room_id))?;

        match handle.join(player_id, name, sender).await {
            Ok(()) => {
                self.player_rooms.insert(player_id, room_id);
                Ok(())
            }
            Err(RoomError::Unavailable(_)) => {
                // The actor is gone; forget the room so nobody else tries it.
                self.rooms.remove(&room_id);
                self.player_rooms.retain(|_, rid| *rid != room_id);
                tracing::warn!(%room_id, "room actor stopped, dropping room");
                Err(RoomError::Unavailable(room_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Removes a player from their current room. The room is dropped if
    /// that was its last occupant.
    pub async fn leave_room(&mut self, player_id: PlayerId) -> Result<RoomId, RoomError> {
        let room_id = self
            .player_rooms
            .remove(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        let departure = match self.rooms.get(&room_id) {
            Some(handle) => handle.leave(player_id).await,
            None => return Ok(room_id),
        };

        match departure {
            Ok(Departure { room_closed: true }) | Err(RoomError::Unavailable(_)) => {
                self.rooms.remove(&room_id);
                self.player_rooms.retain(|_, rid| *rid != room_id);
                tracing::info!(%room_id, rooms = self.rooms.len(), "room closed");
            }
            Ok(Departure { room_closed: false }) => {}
            Err(e) => return Err(e),
        }
        Ok(room_id)
    }

    /// Connection dropped: leaves the player's room, if they had one.
    ///
    /// Returns the room they were removed from.
    pub async fn disconnect(&mut self, player_id: PlayerId) -> Option<RoomId> {
        match self.leave_room(player_id).await {
            Ok(room_id) => {
                tracing::debug!(%player_id, %room_id, "disconnected player removed from room");
                Some(room_id)
            }
            Err(RoomError::NotInRoom(_)) => None,
            Err(e) => {
                tracing::warn!(%player_id, error = %e, "failed to remove disconnected player");
                None
            }
        }
    }

    /// Routes a hold or release to the player's current room.
    pub async fn route_action(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;

        let handle = self
            .rooms
            .get(room_id)
            .ok_or(RoomError::NotFound(*room_id))?;

        handle.send_action(player_id, action).await
    }

    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.info().await
    }

    pub async fn room_snapshot(&self, room_id: RoomId) -> Result<RoomSnapshot, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.snapshot().await
    }

    /// Returns the room a player is currently in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<RoomId> {
        self.player_rooms.get(&player_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    /// Picks an unused six-digit code.
    fn generate_room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let room_id = RoomId(rng.random_range(ROOM_CODE_MIN..=ROOM_CODE_MAX));
            if !self.rooms.contains_key(&room_id) {
                return room_id;
            }
        }
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new()
    }
}
