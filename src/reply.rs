//! Building the outbound chat messages.

use serde::Serialize;

use crate::resolver::{DownloadLink, ResolvedVideo};

/// Longest caption sent, ellipsis included. Counted in chars.
pub const MAX_CAPTION_CHARS: usize = 3500;

const ELLIPSIS: &str = "...";

pub const PROMPT_TEXT: &str =
    "Kirimkan link TikTok (contoh: https://www.tiktok.com/@user/video/12345)";

pub const NOT_FOUND_TEXT: &str = "❌ Maaf, data video tidak ditemukan.";

const DEFAULT_BUTTON_TEXT: &str = "Download";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub url: String,
}

/// One button per row, in download-link order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

/// A `sendMessage` or `sendVideo` call.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text {
        chat_id: i64,
        text: String,
        markdown: bool,
        keyboard: Option<InlineKeyboard>,
    },
    Video {
        chat_id: i64,
        video: String,
        caption: String,
        keyboard: InlineKeyboard,
    },
}

impl OutboundMessage {
    /// Plain text without parse mode or buttons.
    pub fn notice(chat_id: i64, text: &str) -> Self {
        OutboundMessage::Text {
            chat_id,
            text: text.to_string(),
            markdown: false,
            keyboard: None,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            OutboundMessage::Text { .. } => "sendMessage",
            OutboundMessage::Video { .. } => "sendVideo",
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            OutboundMessage::Text { chat_id, .. } | OutboundMessage::Video { chat_id, .. } => {
                *chat_id
            }
        }
    }
}

pub fn build_caption(video: &ResolvedVideo) -> String {
    let author = video.author.as_deref().unwrap_or("");
    let description = video.description.as_deref().unwrap_or("");
    let caption = format!("👤 *{}*\n\n{}", author, description);
    truncate_caption(caption)
}

fn truncate_caption(caption: String) -> String {
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return caption;
    }
    let keep = MAX_CAPTION_CHARS - ELLIPSIS.len();
    let mut truncated: String = caption.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

pub fn build_keyboard(links: &[DownloadLink]) -> InlineKeyboard {
    let inline_keyboard = links
        .iter()
        .map(|link| {
            let text = link
                .text
                .as_deref()
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_BUTTON_TEXT);
            vec![InlineButton {
                text: text.to_string(),
                url: link.href.clone(),
            }]
        })
        .collect();
    InlineKeyboard { inline_keyboard }
}

/// First link whose label mentions mp4, in any case.
pub fn find_playable(links: &[DownloadLink]) -> Option<&DownloadLink> {
    links.iter().find(|link| {
        link.text
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains("mp4"))
    })
}

/// Video with caption and buttons when a playable link exists, otherwise
/// the caption as a text message with the same buttons.
pub fn build_reply(chat_id: i64, video: &ResolvedVideo) -> OutboundMessage {
    let caption = build_caption(video);
    let keyboard = build_keyboard(video.links());

    match find_playable(video.links()) {
        Some(link) => OutboundMessage::Video {
            chat_id,
            video: link.href.clone(),
            caption,
            keyboard,
        },
        None => OutboundMessage::Text {
            chat_id,
            text: caption,
            markdown: true,
            keyboard: Some(keyboard),
        },
    }
}
