use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use thaasbai_server::config::Config;
use thaasbai_server::dispatcher;
use thaasbai_server::protocol::{ClientEvent, GameType, ServerEvent, SessionId};
use thaasbai_server::server::CoordinatorServer;
use tokio::sync::mpsc;
use uuid::Uuid;

type Rx = mpsc::Receiver<ServerEvent>;

fn test_server() -> Arc<CoordinatorServer> {
    CoordinatorServer::new(Config::default())
}

fn register(server: &Arc<CoordinatorServer>) -> (SessionId, Rx) {
    let sid = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(thaasbai_server::session::OUTBOX_CAPACITY);
    server.sessions.insert(sid, "127.0.0.1".parse().unwrap(), tx);
    (sid, rx)
}

fn expect_room_id(event: &ServerEvent) -> String {
    match event {
        ServerEvent::RoomCreated { room_id, .. }
        | ServerEvent::DiguRoomCreated { room_id, .. }
        | ServerEvent::RoomJoined { room_id, .. }
        | ServerEvent::DiguRoomJoined { room_id, .. }
        | ServerEvent::MatchmakingMatched { room_id, .. } => room_id.clone(),
        other => panic!("expected a room-bearing event, got {other:?}"),
    }
}

/// Four players seat, ready up, and the host deals a hand. Every player
/// receives only their own cards, never a flat map of everyone's hands.
#[tokio::test]
async fn dhiha_ei_full_table_sees_only_its_own_hand() {
    let server = test_server();
    let (host, mut host_rx) = register(&server);
    dispatcher::dispatch(&server, host, ClientEvent::CreateRoom { player_name: "Host".into() }).await;
    let room_id = expect_room_id(&host_rx.recv().await.unwrap());

    let (guest_b, mut b_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        guest_b,
        ClientEvent::JoinRoom { room_id: room_id.clone(), player_name: "B".into() },
    )
    .await;
    let _ = b_rx.recv().await.unwrap();
    let _ = host_rx.recv().await.unwrap(); // PlayersChanged

    let (guest_c, mut c_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        guest_c,
        ClientEvent::JoinRoom { room_id: room_id.clone(), player_name: "C".into() },
    )
    .await;
    let _ = c_rx.recv().await.unwrap();
    let _ = host_rx.recv().await.unwrap();
    let _ = b_rx.recv().await.unwrap();

    let (guest_d, mut d_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        guest_d,
        ClientEvent::JoinRoom { room_id: room_id.clone(), player_name: "D".into() },
    )
    .await;
    let _ = d_rx.recv().await.unwrap();
    let _ = host_rx.recv().await.unwrap();
    let _ = b_rx.recv().await.unwrap();
    let _ = c_rx.recv().await.unwrap();

    for sid in [host, guest_b, guest_c, guest_d] {
        dispatcher::dispatch(&server, sid, ClientEvent::SetReady { ready: true }).await;
    }
    // Each ready-up broadcasts PlayersChanged to every seated player.
    for rx in [&mut host_rx, &mut b_rx, &mut c_rx, &mut d_rx] {
        for _ in 0..4 {
            let _ = rx.recv().await.unwrap();
        }
    }

    let mut hands = HashMap::new();
    hands.insert("0".to_string(), json!({ "cards": ["A-spades"] }));
    hands.insert("1".to_string(), json!({ "cards": ["2-diamonds"] }));
    hands.insert("2".to_string(), json!({ "cards": ["3-clubs"] }));
    hands.insert("3".to_string(), json!({ "cards": ["4-hearts"] }));

    dispatcher::dispatch(
        &server,
        host,
        ClientEvent::StartGame { game_state: json!({ "currentPlayerIndex": 0 }), hands },
    )
    .await;

    let host_hand = match host_rx.recv().await.unwrap() {
        ServerEvent::GameStarted { position, hand, .. } => {
            assert_eq!(position, 0);
            hand
        }
        other => panic!("expected GameStarted, got {other:?}"),
    };
    assert_eq!(host_hand, json!({ "cards": ["A-spades"] }));

    let mut seen = vec![0u8];
    for rx in [&mut b_rx, &mut c_rx, &mut d_rx] {
        match rx.recv().await.unwrap() {
            ServerEvent::GameStarted { position, hand, .. } => {
                assert_ne!(hand, host_hand, "a guest must never see the host's hand");
                seen.push(position);
            }
            other => panic!("expected GameStarted, got {other:?}"),
        }
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

/// When the host leaves, the host slot moves to the lowest remaining
/// occupied position and the rest of the table is told the roster changed.
#[tokio::test]
async fn host_migrates_when_the_host_leaves() {
    let server = test_server();
    let (host, mut host_rx) = register(&server);
    dispatcher::dispatch(&server, host, ClientEvent::CreateRoom { player_name: "Host".into() }).await;
    let room_id = expect_room_id(&host_rx.recv().await.unwrap());

    let (guest, mut guest_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        guest,
        ClientEvent::JoinRoom { room_id: room_id.clone(), player_name: "Guest".into() },
    )
    .await;
    let _ = guest_rx.recv().await.unwrap();
    let _ = host_rx.recv().await.unwrap();

    dispatcher::dispatch(&server, host, ClientEvent::LeaveRoom).await;

    match guest_rx.recv().await.unwrap() {
        ServerEvent::PlayersChanged { players } => {
            assert_eq!(players.len(), 1);
            assert!(players.contains_key("1"));
        }
        other => panic!("expected PlayersChanged, got {other:?}"),
    }

    let room = server.rooms.get(GameType::DhihaEi, &room_id).unwrap();
    assert!(room.read().await.is_host(guest));
}

/// A reconnecting session reclaims its grace-held slot under a fresh
/// session id without the room ever being torn down.
#[tokio::test]
async fn reattach_reclaims_the_disconnected_slot() {
    let server = test_server();
    let (host, mut host_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        host,
        ClientEvent::CreateDiguRoom { player_name: "Host".into(), max_players: Some(2) },
    )
    .await;
    let room_id = expect_room_id(&host_rx.recv().await.unwrap());

    let (guest, mut guest_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        guest,
        ClientEvent::JoinDiguRoom { room_id: room_id.clone(), player_name: "Guest".into() },
    )
    .await;
    let _ = guest_rx.recv().await.unwrap();
    let _ = host_rx.recv().await.unwrap();

    // Within the grace window the slot is only marked disconnected, not
    // vacated: the guest sees a presence update, not `player_disconnected`.
    dispatcher::handle_disconnect(&server, host).await;
    match guest_rx.recv().await.unwrap() {
        ServerEvent::DiguPlayersChanged { players } => {
            assert!(!players["0"].connected);
        }
        other => panic!("expected DiguPlayersChanged, got {other:?}"),
    }

    let (new_host, mut new_host_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        new_host,
        ClientEvent::Reattach { room_id: room_id.clone(), previous_oder_id: host },
    )
    .await;

    match new_host_rx.recv().await.unwrap() {
        ServerEvent::DiguRoomJoined { position, room_id: rejoined_room, .. } => {
            assert_eq!(position, 0);
            assert_eq!(rejoined_room, room_id);
        }
        other => panic!("expected DiguRoomJoined, got {other:?}"),
    }
    let _ = guest_rx.recv().await.unwrap(); // DiguPlayersChanged

    let room = server.rooms.get(GameType::Digu, &room_id).unwrap();
    assert!(room.read().await.is_host(new_host));
}

/// Digu matchmaking buckets requests by the table size the players asked
/// for; a trio only ever gets matched against other three-seat requests.
#[tokio::test]
async fn digu_matchmaking_buckets_by_requested_table_size() {
    let server = test_server();
    let mut receivers = Vec::new();
    for name in ["A", "B", "C"] {
        let (sid, rx) = register(&server);
        dispatcher::dispatch(
            &server,
            sid,
            ClientEvent::JoinQueue {
                game_type: GameType::Digu,
                player_name: name.into(),
                max_players: Some(3),
            },
        )
        .await;
        receivers.push(rx);
    }

    let mut room_ids = Vec::new();
    for rx in receivers.iter_mut() {
        match rx.recv().await.unwrap() {
            ServerEvent::MatchmakingMatched { room_id, players, .. } => {
                assert_eq!(players.len(), 3);
                room_ids.push(room_id);
            }
            other => panic!("expected MatchmakingMatched, got {other:?}"),
        }
    }
    assert!(room_ids.windows(2).all(|pair| pair[0] == pair[1]));
}

/// A turn-scoped relay from the wrong seat is rejected and never reaches
/// the rest of the table.
#[tokio::test]
async fn card_played_out_of_turn_is_rejected() {
    let server = test_server();
    let (host, mut host_rx) = register(&server);
    dispatcher::dispatch(&server, host, ClientEvent::CreateRoom { player_name: "Host".into() }).await;
    let room_id = expect_room_id(&host_rx.recv().await.unwrap());

    let (guest, mut guest_rx) = register(&server);
    dispatcher::dispatch(
        &server,
        guest,
        ClientEvent::JoinRoom { room_id, player_name: "Guest".into() },
    )
    .await;
    let _ = guest_rx.recv().await.unwrap();
    let _ = host_rx.recv().await.unwrap();

    dispatcher::dispatch(
        &server,
        guest,
        ClientEvent::UpdateGameState { game_state: json!({ "currentPlayerIndex": 0 }) },
    )
    .await;
    let _ = host_rx.recv().await.unwrap(); // GameStateUpdated

    // It's position 0's (the host's) turn; the guest at position 1 tries anyway.
    dispatcher::dispatch(
        &server,
        guest,
        ClientEvent::CardPlayed { card: json!("card"), position: 1 },
    )
    .await;

    match guest_rx.recv().await.unwrap() {
        ServerEvent::Error { message } => assert_eq!(message, "not_your_turn"),
        other => panic!("expected an error reply, got {other:?}"),
    }
}
