pub mod handlers;
pub mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ServerMessage, ThemeInfo};
use crate::state::AppState;
use crate::store::ProfileStore;
use player::PlayerContext;

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub uid: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request: uid={:?}", params.uid);

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (out, mut outgoing) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: everything for this client goes through `out`, in order
    let writer = tokio::spawn(async move {
        while let Some(msg) = outgoing.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        tracing::debug!("Client went away, stopping writer");
                        break;
                    }
                }
                Err(e) => tracing::error!("Failed to serialize server message: {}", e),
            }
        }
    });

    let profile = match params.uid.as_ref() {
        Some(uid) => match state.profiles.get(uid).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("WebSocket for unknown profile: {}", e);
                let _ = out.send(ServerMessage::error(
                    "UNKNOWN_USER",
                    "Profile not found, playing anonymously",
                ));
                None
            }
        },
        None => None,
    };

    let _ = out.send(ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        display_name: profile.as_ref().map(|p| p.display_name.clone()),
        themes: ThemeInfo::all(),
    });

    let mut ctx = PlayerContext::new(profile.map(|p| p.uid));

    while let Some(ws_msg) = receiver.next().await {
        match ws_msg {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received message: {}", text.as_str());

                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        if let Some(response) =
                            handlers::handle_message(client_msg, &mut ctx, &state, &out).await
                        {
                            if out.send(response).is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse client message: {}", e);
                        let _ = out.send(ServerMessage::error(
                            "PARSE_ERROR",
                            format!("Invalid message format: {}", e),
                        ));
                    }
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("WebSocket closed");
                break;
            }
            // axum answers pings itself
            Ok(_) => {}
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
        }
    }

    if let Some(session) = ctx.session.take() {
        if !session.state().is_terminal() {
            tracing::info!("Session {} dropped with its connection, not scored", session.id);
        }
    }

    drop(out);
    let _ = writer.await;
    tracing::info!("WebSocket connection closed for uid: {:?}", ctx.uid);
}
