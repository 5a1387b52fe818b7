//! # Circle Chat
//!
//! REST access to per-circle chat history, and a WebSocket relay at `/ws`.
//!
//! ## WebSocket protocol
//!
//! JSON text frames, discriminated by `type`:
//!
//! | Direction | Frame |
//! |-----------|-------|
//! | client → server | `{"type":"join","circleAddress":"0x…"}` |
//! | server → client | `{"type":"history","messages":[…]}` |
//! | client → server | `{"type":"chat","circleAddress":"0x…","address":"0x…","text":"…"}` |
//! | server → client | `{"type":"message","address":"0x…","text":"…","timestamp":…}` |
//!
//! A session follows one circle at a time; a later `join` replaces the
//! earlier one. Chat frames are echoed to the sender and relayed to every
//! other session joined to that circle. Malformed frames are logged and
//! ignored.

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use circle_core::Address;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;

use crate::chat::ChatMessage;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, parse_address, Validate};
use crate::state::AppState;

/// Chat history of one circle.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatHistoryResponse {
    /// Messages, oldest first.
    pub messages: Vec<ChatMessage>,
}

/// Post a chat message over HTTP.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    /// Author account.
    pub address: Option<String>,
    /// Message text.
    pub text: Option<String>,
}

impl Validate for PostMessageRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.address.is_none() {
            return Err(AppError::MissingParameter("address".into()));
        }
        if self.text.is_none() {
            return Err(AppError::MissingParameter("text".into()));
        }
        Ok(())
    }
}

/// Frames a client sends.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientFrame {
    Join {
        #[serde(rename = "circleAddress")]
        circle_address: Address,
    },
    Chat {
        #[serde(rename = "circleAddress")]
        circle_address: Address,
        address: Address,
        text: String,
    },
}

/// Frames the server sends.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerFrame {
    History { messages: Vec<ChatMessage> },
    Message(ChatMessage),
}

/// Build the chat router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat/:circle", get(get_history).post(post_message))
        .route("/ws", get(ws_upgrade))
}

/// GET /api/chat/:circle: Chat history of a circle.
#[utoipa::path(
    get,
    path = "/api/chat/{circle}",
    params(("circle" = String, Path, description = "Circle contract address")),
    responses(
        (status = 200, description = "History, oldest first", body = ChatHistoryResponse),
        (status = 422, description = "Invalid address", body = crate::error::ErrorBody),
    ),
    tag = "chat"
)]
pub(crate) async fn get_history(
    State(state): State<AppState>,
    Path(circle): Path<String>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let circle = parse_address(&circle)?;
    let messages = state.chat.history(&circle).await?;
    Ok(Json(ChatHistoryResponse { messages }))
}

/// POST /api/chat/:circle: Store a message and relay it to joined sessions.
#[utoipa::path(
    post,
    path = "/api/chat/{circle}",
    params(("circle" = String, Path, description = "Circle contract address")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = ChatMessage),
        (status = 400, description = "Missing field", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid address or empty text", body = crate::error::ErrorBody),
    ),
    tag = "chat"
)]
pub(crate) async fn post_message(
    State(state): State<AppState>,
    Path(circle): Path<String>,
    body: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let circle = parse_address(&circle)?;
    let req = extract_validated_json(body)?;
    let author = parse_address(req.address.as_deref().unwrap_or_default())?;
    let message = state
        .chat
        .post(&circle, author, req.text.unwrap_or_default(), None)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /ws: Upgrade to the chat relay.
async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| chat_session(socket, state))
}

async fn chat_session(socket: WebSocket, state: AppState) {
    let session = state.chat.open_session();
    let (mut sink, mut stream) = socket.split();
    let mut relay = state.chat.subscribe();
    let mut joined: Option<Address> = None;
    tracing::debug!(session, "chat session opened");

    loop {
        tokio::select! {
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(session, error = %e, "chat socket error");
                        break;
                    }
                };
                let reply = match handle_frame(&state, session, &mut joined, &text).await {
                    Ok(reply) => reply,
                    Err(reason) => {
                        tracing::warn!(session, %reason, "ignoring chat frame");
                        None
                    }
                };
                if let Some(frame) = reply {
                    if send_frame(&mut sink, &frame).await.is_err() {
                        break;
                    }
                }
            }
            relayed = relay.recv() => match relayed {
                Ok(m) if m.origin != Some(session) && joined.as_ref() == Some(&m.circle) => {
                    if send_frame(&mut sink, &ServerFrame::Message(m.message)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(session, skipped, "chat session lagged behind relay");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    tracing::debug!(session, "chat session closed");
}

/// Apply one client frame. Returns the frame to send back to this session.
async fn handle_frame(
    state: &AppState,
    session: u64,
    joined: &mut Option<Address>,
    raw: &str,
) -> Result<Option<ServerFrame>, String> {
    let frame: ClientFrame = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    match frame {
        ClientFrame::Join { circle_address } => {
            let messages = state
                .chat
                .history(&circle_address)
                .await
                .map_err(|e| e.to_string())?;
            *joined = Some(circle_address);
            Ok(Some(ServerFrame::History { messages }))
        }
        ClientFrame::Chat {
            circle_address,
            address,
            text,
        } => {
            let message = state
                .chat
                .post(&circle_address, address, text, Some(session))
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(ServerFrame::Message(message)))
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ServerFrame) -> Result<(), axum::Error>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    sink.send(Message::Text(json)).await
}
