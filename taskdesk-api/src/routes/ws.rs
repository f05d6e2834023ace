/// Live notification WebSocket
///
/// `GET /ws` upgrades to a WebSocket speaking JSON frames of the form
/// `{"event": "...", "data": ...}`:
///
/// ```text
/// client → {"event": "authenticate", "data": {"token": "<access JWT>"}}
/// server → {"event": "authenticated", "data": {"success": true, "user_id": 7}}
/// server → {"event": "notification", "data": { ...notification... }}
/// ```
///
/// Nothing is pushed until the client authenticates. Authenticating again
/// switches to the new user's room. Missed pushes are not replayed; the inbox
/// endpoints stay authoritative.

use crate::app::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use taskdesk_shared::{
    auth::middleware::authenticate_token, models::notification::Notification,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Authenticate { token: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Authenticated(AuthOutcome),
    Notification(Notification),
}

#[derive(Debug, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The user's room this connection is subscribed to
struct Room {
    user_id: i64,
    rx: broadcast::Receiver<Notification>,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn next_push(room: &mut Option<Room>) -> Result<Notification, RecvError> {
    match room {
        Some(room) => room.rx.recv().await,
        None => std::future::pending().await,
    }
}

fn leave(state: &AppState, room: &mut Option<Room>) {
    if let Some(Room { user_id, rx }) = room.take() {
        drop(rx);
        state.hub.release(user_id);
    }
}

async fn authenticate(state: &AppState, room: &mut Option<Room>, token: &str) -> AuthOutcome {
    match authenticate_token(state.users.as_ref(), token, state.jwt_secret()).await {
        Ok(actor) => {
            leave(state, room);
            *room = Some(Room {
                user_id: actor.user_id,
                rx: state.hub.subscribe(actor.user_id),
            });
            info!(user_id = actor.user_id, "WebSocket authenticated");
            AuthOutcome {
                success: true,
                user_id: Some(actor.user_id),
                error: None,
            }
        }
        Err(e) => {
            debug!(error = %e, "WebSocket authentication failed");
            AuthOutcome {
                success: false,
                user_id: None,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut room: Option<Room> = None;

    loop {
        let event = tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(ClientEvent::Authenticate { token }) => {
                        ServerEvent::Authenticated(authenticate(&state, &mut room, &token).await)
                    }
                    Err(e) => {
                        debug!(error = %e, "Ignoring unrecognised WebSocket frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive failed");
                    break;
                }
            },
            pushed = next_push(&mut room) => match pushed {
                Ok(notification) => ServerEvent::Notification(notification),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging, notifications dropped");
                    continue;
                }
                Err(RecvError::Closed) => {
                    room = None;
                    continue;
                }
            },
        };

        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Failed to encode WebSocket event");
                continue;
            }
        };
        if sink.send(Message::Text(text)).await.is_err() {
            break;
        }
    }

    leave(&state, &mut room);
    debug!("WebSocket closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_shape() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "authenticate",
            "data": { "token": "abc" }
        }))
        .unwrap();
        assert!(matches!(event, ClientEvent::Authenticate { token } if token == "abc"));
    }

    #[test]
    fn test_authenticated_event_shape() {
        let ok = serde_json::to_value(ServerEvent::Authenticated(AuthOutcome {
            success: true,
            user_id: Some(7),
            error: None,
        }))
        .unwrap();
        assert_eq!(
            ok,
            json!({ "event": "authenticated", "data": { "success": true, "user_id": 7 } })
        );

        let failed = serde_json::to_value(ServerEvent::Authenticated(AuthOutcome {
            success: false,
            user_id: None,
            error: Some("Token expired".to_string()),
        }))
        .unwrap();
        assert_eq!(failed["data"]["success"], json!(false));
        assert!(failed["data"].get("user_id").is_none());
    }
}
