use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thaasbai_server::config::Config;
use thaasbai_server::server::bootstrap;
use thaasbai_server::websocket::create_router;
use tokio::net::TcpListener;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

async fn spawn_server() -> SocketAddr {
    let server = bootstrap(Config::default());
    let app = create_router("*").with_state(server);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    addr
}

async fn recv_json<S>(stream: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let msg = timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("websocket error");
    match msg {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

/// Two players create and join a Digu room, ready up, and start the game
/// over a real websocket connection; hands remain private to their owner.
#[tokio::test]
async fn digu_room_lifecycle_over_websocket() {
    let addr = spawn_server().await;
    let url = format!("ws://{addr}/ws");

    let (host_ws, _) = connect_async(&url).await.unwrap();
    let (mut host_write, mut host_read) = host_ws.split();
    let connected = recv_json(&mut host_read).await;
    assert_eq!(connected["event"], "connected");

    host_write
        .send(Message::Text(
            json!({
                "event": "create_digu_room",
                "data": { "playerName": "Host", "maxPlayers": 2 }
            })
            .to_string()
            .into(),
        ))
        .await
        .unwrap();
    let created = recv_json(&mut host_read).await;
    assert_eq!(created["event"], "digu_room_created");
    let room_id = created["data"]["roomId"].as_str().unwrap().to_string();

    let (guest_ws, _) = connect_async(&url).await.unwrap();
    let (mut guest_write, mut guest_read) = guest_ws.split();
    let connected = recv_json(&mut guest_read).await;
    assert_eq!(connected["event"], "connected");

    guest_write
        .send(Message::Text(
            json!({
                "event": "join_digu_room",
                "data": { "roomId": room_id, "playerName": "Guest" }
            })
            .to_string()
            .into(),
        ))
        .await
        .unwrap();
    let joined = recv_json(&mut guest_read).await;
    assert_eq!(joined["event"], "digu_room_joined");
    let changed = recv_json(&mut host_read).await;
    assert_eq!(changed["event"], "digu_players_changed");

    let ready_frame = || {
        Message::Text(
            json!({ "event": "digu_set_ready", "data": { "ready": true } })
                .to_string()
                .into(),
        )
    };
    host_write.send(ready_frame()).await.unwrap();
    guest_write.send(ready_frame()).await.unwrap();
    // Both ready-ups broadcast to both sockets.
    for _ in 0..2 {
        let _ = recv_json(&mut host_read).await;
    }
    for _ in 0..2 {
        let _ = recv_json(&mut guest_read).await;
    }

    host_write
        .send(Message::Text(
            json!({
                "event": "start_digu_game",
                "data": {
                    "gameState": { "currentPlayerIndex": 0 },
                    "hands": { "0": { "cards": ["A-spades"] }, "1": { "cards": ["2-diamonds"] } }
                }
            })
            .to_string()
            .into(),
        ))
        .await
        .unwrap();

    let host_started = recv_json(&mut host_read).await;
    assert_eq!(host_started["event"], "digu_game_started");
    assert_eq!(host_started["data"]["hand"], json!({ "cards": ["A-spades"] }));

    let guest_started = recv_json(&mut guest_read).await;
    assert_eq!(guest_started["event"], "digu_game_started");
    assert_eq!(guest_started["data"]["hand"], json!({ "cards": ["2-diamonds"] }));
    assert_ne!(guest_started["data"]["hand"], host_started["data"]["hand"]);
}

/// `/health` reports healthy once the server is up.
#[tokio::test]
async fn health_endpoint_reports_ok() {
    let addr = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

/// The documented liveness path at `/` serves the same check as `/health`.
#[tokio::test]
async fn root_endpoint_reports_ok() {
    let addr = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

/// `/admin` is absent (404) unless an admin password is configured.
#[tokio::test]
async fn admin_endpoint_disabled_without_password() {
    let addr = spawn_server().await;
    let response = reqwest::get(format!("http://{addr}/admin")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
