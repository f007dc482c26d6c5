//! Telegram webhook endpoint.
//!
//! Every request is answered with 200. Telegram redelivers updates on any
//! other status, so failures are reported in the body as `{"ok": false}`
//! and in the log.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::links::extract_first_url;
use crate::reply::{build_reply, OutboundMessage, NOT_FOUND_TEXT, PROMPT_TEXT};
use crate::resolver::VideoResolver;
use crate::telegram::ChatSender;
use crate::update::Update;

/// Collaborators shared by all requests.
pub struct AppState {
    pub sender: Arc<dyn ChatSender>,
    pub resolver: Arc<dyn VideoResolver>,
}

impl AppState {
    pub fn new(sender: Arc<dyn ChatSender>, resolver: Arc<dyn VideoResolver>) -> Self {
        Self { sender, resolver }
    }
}

/// Acknowledgment body returned to Telegram.
#[derive(Debug, Serialize, PartialEq)]
pub struct Ack {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: &anyhow::Error) -> Self {
        Self {
            ok: false,
            error: Some(format!("{:#}", error)),
        }
    }
}

/// How a processed update ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No message kind or no chat to answer.
    Ignored,
    /// No URL in the text; the prompt was sent.
    Prompted,
    /// The resolver had no video data; the not-found notice was sent.
    NotFound,
    /// Video sent inline.
    SentVideo,
    /// Caption and buttons sent as text.
    SentText,
}

pub fn router(state: Arc<AppState>, path: &str) -> Router {
    Router::new()
        .route(path, any(webhook))
        .with_state(state)
}

pub async fn webhook(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return (StatusCode::OK, "OK").into_response();
    }

    let ack = match handle_body(&state, &body).await {
        Ok(outcome) => {
            debug!("Update finished: {:?}", outcome);
            Ack::ok()
        }
        Err(e) => {
            error!("Handler error: {:#}", e);
            Ack::failed(&e)
        }
    };

    (StatusCode::OK, Json(ack)).into_response()
}

async fn handle_body(state: &AppState, body: &[u8]) -> Result<Outcome> {
    let update: Update = serde_json::from_slice(body).context("Malformed update body")?;
    process_update(state, update).await
}

/// Run one update through extraction, resolution and dispatch.
pub async fn process_update(state: &AppState, update: Update) -> Result<Outcome> {
    let update_id = update.update_id;

    let Some(post) = update.into_post() else {
        debug!("Update {:?} has no message, edited_message or channel_post", update_id);
        return Ok(Outcome::Ignored);
    };

    let Some(chat_id) = post.chat_id() else {
        debug!("Update {:?} ({}) has no chat id", update_id, post.kind());
        return Ok(Outcome::Ignored);
    };

    info!("Update {:?}: {} in chat {}", update_id, post.kind(), chat_id);

    let Some(url) = extract_first_url(post.text()) else {
        state
            .sender
            .send(OutboundMessage::notice(chat_id, PROMPT_TEXT))
            .await?;
        return Ok(Outcome::Prompted);
    };

    let Some(video) = state.resolver.resolve(url).await? else {
        info!("No video data for {}", url);
        state
            .sender
            .send(OutboundMessage::notice(chat_id, NOT_FOUND_TEXT))
            .await?;
        return Ok(Outcome::NotFound);
    };

    let reply = build_reply(chat_id, &video);
    let outcome = match reply {
        OutboundMessage::Video { .. } => Outcome::SentVideo,
        OutboundMessage::Text { .. } => Outcome::SentText,
    };
    info!("Replying to chat {} with {}", chat_id, reply.method());
    state.sender.send(reply).await?;

    Ok(outcome)
}
