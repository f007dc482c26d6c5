use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use tracing::debug;

use crate::reply::{InlineKeyboard, OutboundMessage};

/// Delivers outbound messages to a chat.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<()>;
}

/// Bot API sender backed by teloxide.
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn to_markup(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .inline_keyboard
        .iter()
        .map(|row| -> Result<Vec<InlineKeyboardButton>> {
            row.iter()
                .map(|button| -> Result<InlineKeyboardButton> {
                    let url = reqwest::Url::parse(&button.url).with_context(|| {
                        format!("Invalid download link for button '{}': {}", button.text, button.url)
                    })?;
                    Ok(InlineKeyboardButton::url(button.text.clone(), url))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

// Captions are built with legacy Markdown (`*bold*`), which MarkdownV2
// would reject unescaped.
#[allow(deprecated)]
const CAPTION_PARSE_MODE: ParseMode = ParseMode::Markdown;

#[async_trait]
impl ChatSender for TelegramSender {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        let method = message.method();
        debug!("Calling {} for chat {}", method, message.chat_id());

        match message {
            OutboundMessage::Text {
                chat_id,
                text,
                markdown,
                keyboard,
            } => {
                let mut request = self.bot.send_message(ChatId(chat_id), text);
                if markdown {
                    request = request.parse_mode(CAPTION_PARSE_MODE);
                }
                if let Some(keyboard) = keyboard {
                    request = request.reply_markup(to_markup(&keyboard)?);
                }
                request
                    .await
                    .with_context(|| format!("Telegram {} failed", method))?;
            }
            OutboundMessage::Video {
                chat_id,
                video,
                caption,
                keyboard,
            } => {
                let video_url = reqwest::Url::parse(&video)
                    .with_context(|| format!("Invalid video link: {}", video))?;
                self.bot
                    .send_video(ChatId(chat_id), InputFile::url(video_url))
                    .caption(caption)
                    .parse_mode(CAPTION_PARSE_MODE)
                    .reply_markup(to_markup(&keyboard)?)
                    .await
                    .with_context(|| format!("Telegram {} failed", method))?;
            }
        }

        Ok(())
    }
}
