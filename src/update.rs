//! Inbound Telegram update model.
//!
//! Only the fields the webhook consumes are declared; everything else in
//! Telegram's `Update` schema is ignored by serde.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Post>,
    #[serde(default)]
    pub edited_message: Option<Post>,
    #[serde(default)]
    pub channel_post: Option<Post>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Post {
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<i64>,
}

/// The one message kind an update is processed as.
#[derive(Debug, Clone)]
pub enum IncomingPost {
    Message(Post),
    EditedMessage(Post),
    ChannelPost(Post),
}

impl Update {
    /// Pick `message`, then `edited_message`, then `channel_post`.
    pub fn into_post(self) -> Option<IncomingPost> {
        self.message
            .map(IncomingPost::Message)
            .or_else(|| self.edited_message.map(IncomingPost::EditedMessage))
            .or_else(|| self.channel_post.map(IncomingPost::ChannelPost))
    }
}

impl IncomingPost {
    pub fn kind(&self) -> &'static str {
        match self {
            IncomingPost::Message(_) => "message",
            IncomingPost::EditedMessage(_) => "edited_message",
            IncomingPost::ChannelPost(_) => "channel_post",
        }
    }

    pub fn post(&self) -> &Post {
        match self {
            IncomingPost::Message(post)
            | IncomingPost::EditedMessage(post)
            | IncomingPost::ChannelPost(post) => post,
        }
    }

    /// Chat to reply to. A zero id is treated as missing.
    pub fn chat_id(&self) -> Option<i64> {
        self.post()
            .chat
            .as_ref()
            .and_then(|chat| chat.id)
            .filter(|id| *id != 0)
    }

    /// Message text, falling back to the media caption. Empty strings count
    /// as absent.
    pub fn text(&self) -> &str {
        let post = self.post();
        post.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| post.caption.as_deref())
            .unwrap_or("")
    }
}
