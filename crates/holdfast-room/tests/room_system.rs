//! Integration tests for room actors and the room manager.
//!
//! These run real actor tasks and real Tokio timers on a paused clock,
//! so the five-second countdown and the bidding ticks resolve instantly.

use std::time::Duration;

use holdfast_protocol::{GameOverReason, Phase, PlayerId, RoomId, ServerMessage};
use holdfast_room::{PlayerAction, RoomConfig, RoomError, RoomManager};
use tokio::sync::mpsc;
use tokio::time;

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

const ADA: PlayerId = PlayerId(1);
const BAB: PlayerId = PlayerId(2);

fn inbox() -> (mpsc::UnboundedSender<ServerMessage>, Inbox) {
    mpsc::unbounded_channel()
}

/// Waits for the first message matching `pred`, discarding the rest.
async fn recv_until(
    rx: &mut Inbox,
    mut pred: impl FnMut(&ServerMessage) -> bool,
) -> ServerMessage {
    time::timeout(Duration::from_secs(60), async {
        loop {
            let msg = rx.recv().await.expect("room closed the channel");
            if pred(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("timed out waiting for message")
}

fn create_solo(manager: &mut RoomManager, config: RoomConfig) -> (RoomId, Inbox) {
    let (tx, rx) = inbox();
    let room_id = manager.create_room(ADA, "ada", config, tx).unwrap();
    (room_id, rx)
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_registers_founder() {
    let mut manager = RoomManager::new();
    let (room_id, mut rx) = create_solo(&mut manager, RoomConfig::new(60, 3));

    assert_eq!(manager.room_count(), 1);
    assert_eq!(manager.player_room(ADA), Some(room_id));
    assert!((100_000..=999_999).contains(&room_id.0));
    assert!(manager.get_room(room_id).is_some());

    let joined = recv_until(&mut rx, |m| matches!(m, ServerMessage::RoomJoined { .. })).await;
    assert_eq!(joined, ServerMessage::RoomJoined { room_id, player_id: ADA });
    recv_until(&mut rx, |m| matches!(m, ServerMessage::RoundStarted { round: 1, .. })).await;

    let info = manager.get_room_info(room_id).await.unwrap();
    assert_eq!(info.phase, Phase::Waiting);
    assert_eq!(info.player_count, 1);
    assert_eq!(info.max_players, 4);
    assert_eq!(info.max_rounds, 3);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_registers_nothing() {
    let mut manager = RoomManager::new();
    let (tx, _rx) = inbox();

    let err = manager
        .create_room(ADA, "ada", RoomConfig::new(5, 3), tx)
        .unwrap_err();

    assert!(matches!(err, RoomError::InvalidConfig { field: "initial_time", .. }));
    assert_eq!(manager.room_count(), 0);
    assert_eq!(manager.player_room(ADA), None);
}

#[tokio::test(start_paused = true)]
async fn test_one_room_per_player() {
    let mut manager = RoomManager::new();
    let (room_id, _rx) = create_solo(&mut manager, RoomConfig::default());
    let (tx, _rx2) = inbox();

    let err = manager
        .create_room(ADA, "ada", RoomConfig::default(), tx.clone())
        .unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom(ADA, id) if id == room_id));

    let err = manager.join_room(ADA, room_id, "ada", tx).await.unwrap_err();
    assert!(matches!(err, RoomError::AlreadyInRoom(..)));
}

#[tokio::test(start_paused = true)]
async fn test_join_unknown_room() {
    let mut manager = RoomManager::new();
    let (tx, _rx) = inbox();
    let err = manager
        .join_room(BAB, RoomId(123_456), "bab", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomError::NotFound(RoomId(123_456))));
    assert_eq!(manager.player_room(BAB), None);
}

#[tokio::test(start_paused = true)]
async fn test_join_rejection_leaves_player_unassigned() {
    let mut manager = RoomManager::new();
    let (room_id, _rx) = create_solo(&mut manager, RoomConfig::default());
    let (tx, _rx2) = inbox();

    let err = manager.join_room(BAB, room_id, "ada", tx).await.unwrap_err();

    assert!(matches!(err, RoomError::NameTaken(_)));
    assert_eq!(manager.player_room(BAB), None);
}

#[tokio::test(start_paused = true)]
async fn test_joiner_and_founder_both_hear_about_it() {
    let mut manager = RoomManager::new();
    let (room_id, mut ada_rx) = create_solo(&mut manager, RoomConfig::default());
    let (tx, mut bab_rx) = inbox();

    manager.join_room(BAB, room_id, "bab", tx).await.unwrap();

    recv_until(&mut bab_rx, |m| matches!(m, ServerMessage::RoomJoined { player_id: BAB, .. })).await;
    recv_until(&mut ada_rx, |m| {
        matches!(m, ServerMessage::Notice { text } if text.contains("bab"))
    })
    .await;
    let snapshot = manager.room_snapshot(room_id).await.unwrap();
    let names: Vec<&str> = snapshot.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ada", "bab"]);
    assert_eq!(snapshot.players[1].time_budget, 60);
}

#[tokio::test(start_paused = true)]
async fn test_actions_need_a_room() {
    let manager = RoomManager::new();
    let err = manager.route_action(ADA, PlayerAction::Hold).await.unwrap_err();
    assert!(matches!(err, RoomError::NotInRoom(ADA)));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_without_room_is_noop() {
    let mut manager = RoomManager::new();
    assert_eq!(manager.disconnect(ADA).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_last_leave_drops_room() {
    let mut manager = RoomManager::new();
    let (room_id, _rx) = create_solo(&mut manager, RoomConfig::default());
    let handle = manager.get_room(room_id).unwrap();

    assert_eq!(manager.leave_room(ADA).await.unwrap(), room_id);

    assert_eq!(manager.room_count(), 0);
    assert_eq!(manager.player_room(ADA), None);
    assert!(matches!(handle.info().await, Err(RoomError::Unavailable(_))));
}

#[tokio::test(start_paused = true)]
async fn test_remove_room_forgets_occupants() {
    let mut manager = RoomManager::new();
    let (room_id, _rx) = create_solo(&mut manager, RoomConfig::default());

    manager.remove_room(room_id).await.unwrap();

    assert_eq!(manager.room_count(), 0);
    assert_eq!(manager.player_room(ADA), None);
    assert!(matches!(
        manager.remove_room(room_id).await,
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_join_stopped_room_drops_it() {
    let mut manager = RoomManager::new();
    let (room_id, _rx) = create_solo(&mut manager, RoomConfig::default());

    manager.get_room(room_id).unwrap().shutdown().await.unwrap();
    time::sleep(Duration::from_millis(10)).await;

    let (tx, _bab_rx) = inbox();
    assert!(matches!(
        manager.join_room(BAB, room_id, "bab", tx).await,
        Err(RoomError::Unavailable(id)) if id == room_id
    ));
    assert_eq!(manager.room_count(), 0);
    assert_eq!(manager.player_room(ADA), None);
    assert_eq!(manager.player_room(BAB), None);
    assert!(manager.get_room(room_id).is_none());
}

// =========================================================================
// Rounds through the actor
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_solo_game_ends_with_sole_survivor() {
    let mut manager = RoomManager::new();
    let (_room_id, mut rx) = create_solo(&mut manager, RoomConfig::new(60, 5));

    manager.route_action(ADA, PlayerAction::Hold).await.unwrap();
    recv_until(&mut rx, |m| matches!(m, ServerMessage::BiddingStarted { .. })).await;

    time::sleep(Duration::from_millis(3500)).await;
    manager.route_action(ADA, PlayerAction::Release).await.unwrap();

    let won = recv_until(&mut rx, |m| matches!(m, ServerMessage::RoundWon { .. })).await;
    assert!(matches!(won, ServerMessage::RoundWon { duration: 3, tie: false, .. }));

    let over = recv_until(&mut rx, |m| matches!(m, ServerMessage::GameOver { .. })).await;
    assert!(matches!(
        over,
        ServerMessage::GameOver { reason: GameOverReason::SoleSurvivor, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_arrive_in_order() {
    let mut manager = RoomManager::new();
    let (_room_id, mut rx) = create_solo(&mut manager, RoomConfig::default());

    manager.route_action(ADA, PlayerAction::Hold).await.unwrap();

    let mut ticks = Vec::new();
    while ticks.last() != Some(&0) {
        if let ServerMessage::CountdownTick { remaining } =
            recv_until(&mut rx, |m| matches!(m, ServerMessage::CountdownTick { .. })).await
        {
            ticks.push(remaining);
        }
    }
    assert_eq!(ticks, vec![5, 4, 3, 2, 1, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_leaving_mid_round_ends_two_player_game() {
    let mut manager = RoomManager::new();
    let (room_id, mut ada_rx) = create_solo(&mut manager, RoomConfig::default());
    let (tx, _bab_rx) = inbox();
    manager.join_room(BAB, room_id, "bab", tx).await.unwrap();

    manager.route_action(ADA, PlayerAction::Hold).await.unwrap();
    manager.route_action(BAB, PlayerAction::Hold).await.unwrap();
    recv_until(&mut ada_rx, |m| matches!(m, ServerMessage::BiddingStarted { .. })).await;

    manager.leave_room(BAB).await.unwrap();

    let over = recv_until(&mut ada_rx, |m| matches!(m, ServerMessage::GameOver { .. })).await;
    assert!(matches!(
        over,
        ServerMessage::GameOver { reason: GameOverReason::InsufficientPlayers, .. }
    ));
    assert_eq!(manager.room_count(), 1, "ada is still in the room");
    let info = manager.get_room_info(room_id).await.unwrap();
    assert_eq!(info.phase, Phase::GameOver);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_countdown_ends_two_player_game() {
    let mut manager = RoomManager::new();
    let (room_id, mut ada_rx) = create_solo(&mut manager, RoomConfig::default());
    let (tx, bab_rx) = inbox();
    manager.join_room(BAB, room_id, "bab", tx).await.unwrap();
    drop(bab_rx);

    manager.route_action(ADA, PlayerAction::Hold).await.unwrap();
    manager.route_action(BAB, PlayerAction::Hold).await.unwrap();
    recv_until(&mut ada_rx, |m| matches!(m, ServerMessage::CountdownTick { remaining: 5 })).await;

    assert_eq!(manager.disconnect(BAB).await, Some(room_id));

    // With one player left the game cannot go on.
    let over = recv_until(&mut ada_rx, |m| matches!(m, ServerMessage::GameOver { .. })).await;
    assert!(matches!(
        over,
        ServerMessage::GameOver { reason: GameOverReason::InsufficientPlayers, .. }
    ));
}
