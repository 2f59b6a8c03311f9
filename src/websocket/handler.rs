use std::net::IpAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::dispatcher;
use crate::protocol::{validation, ClientEvent, CoordinatorError, ServerEvent};
use crate::rate_limit::AdmissionError;
use crate::server::CoordinatorServer;

/// WebSocket upgrade handler. Admission is checked before the socket is
/// accepted so a rejected connection never reaches the read/write loop.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(server): State<Arc<CoordinatorServer>>,
) -> Response {
    let ip = addr.ip();
    if let Err(err) = server.admission.try_admit(ip).await {
        let status = match err {
            AdmissionError::TooManyConnections | AdmissionError::RateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
        };
        return status.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, server, ip))
}

async fn handle_socket(socket: WebSocket, server: Arc<CoordinatorServer>, ip: IpAddr) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let sid = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(crate::session::OUTBOX_CAPACITY);

    server.sessions.insert(sid, ip, tx);
    server.note_connection();
    server.sessions.send(sid, ServerEvent::Connected { sid });

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_server = Arc::clone(&server);
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => handle_frame(&recv_server, sid, text.as_bytes()).await,
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher::handle_disconnect(&server, sid).await;
    server.admission_release_on_ip(ip);
}

async fn handle_frame(server: &Arc<CoordinatorServer>, sid: Uuid, raw: &[u8]) {
    if validation::validate_frame_size(raw).is_err() {
        server.sessions.send(sid, ServerEvent::Error {
            message: CoordinatorError::InvalidPayload.wire_message(),
        });
        return;
    }
    match serde_json::from_slice::<ClientEvent>(raw) {
        Ok(event) => dispatcher::dispatch(server, sid, event).await,
        Err(_) => server.sessions.send(sid, ServerEvent::Error {
            message: CoordinatorError::InvalidPayload.wire_message(),
        }),
    }
}
