// SPDX-License-Identifier: MIT

//! `/ws`: greet, then rebroadcast every bus event to the connected client
//! until it disconnects or a send fails.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use crate::state::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let greeting = json!({ "type": "connection", "status": "connected", "message": "subscribed to build events" });
    let Ok(greeting) = serde_json::to_string(&greeting) else {
        return;
    };
    if socket.send(Message::Text(greeting)).await.is_err() {
        return;
    }

    state.ws_connect();
    let (_subscriber, mut events) = state.subscribe_all();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Ok(payload) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Text(text))) => {
                        // Inbound commands are a declared future extension; for now
                        // every client message is just echoed back.
                        if socket.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
    state.ws_disconnect();
}
