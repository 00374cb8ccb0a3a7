//! Messages and their parts.

use serde::{Deserialize, Serialize};

use crate::payload::{ParamValue, Payload};
use crate::types::{
    Animation, Audio, Chat, ChatBackground, Contact, Document, InlineKeyboardMarkup, Location,
    PaidMediaInfo, PhotoSize, Poll, SuccessfulPayment, User, Video, Voice,
};

/// Text formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
    /// Legacy mode kept for backward compatibility.
    Markdown,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarkdownV2 => "MarkdownV2",
            Self::Html => "HTML",
            Self::Markdown => "Markdown",
        }
    }
}

impl ParamValue for ParseMode {
    fn write_param(self, key: &str, _force: bool, payload: &mut Payload) {
        payload.put_text(key, self.as_str().to_string(), true);
    }
}

/// A formatted span of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    /// `bold`, `italic`, `url`, `mention`, `bot_command`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Offset in UTF-16 code units.
    pub offset: u32,
    /// Length in UTF-16 code units.
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl MessageEntity {
    /// Creates an entity without extra fields.
    pub fn new(kind: impl Into<String>, offset: u32, length: u32) -> Self {
        Self {
            kind: kind.into(),
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
        }
    }
}

/// Identifier of a sent message, as returned by `copyMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    pub message_id: i64,
}

/// Describes the message to reply to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyParameters {
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<crate::types::ChatId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sending_without_reply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

impl ReplyParameters {
    pub fn new(message_id: i64) -> Self {
        Self {
            message_id,
            chat_id: None,
            allow_sending_without_reply: None,
            quote: None,
        }
    }
}

/// Link preview generation options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkPreviewOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer_small_media: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_above_text: Option<bool>,
}

// =============================================================================
// Origins
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOriginUser {
    pub date: i64,
    pub sender_user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOriginHiddenUser {
    pub date: i64,
    pub sender_user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOriginChat {
    pub date: i64,
    pub sender_chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOriginChannel {
    pub date: i64,
    pub chat: Chat,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_signature: Option<String>,
}

crate::variant_family! {
    /// Where a forwarded message came from, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum MessageOrigin: "type" {
        "user" => User(MessageOriginUser),
        "hidden_user" => HiddenUser(MessageOriginHiddenUser),
        "chat" => Chat(MessageOriginChat),
        "channel" => Channel(MessageOriginChannel),
    }
}

// =============================================================================
// Reactions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTypeEmoji {
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTypeCustomEmoji {
    pub custom_emoji_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTypePaid {}

crate::variant_family! {
    /// A reaction, keyed by `type`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ReactionType: "type" {
        "emoji" => Emoji(ReactionTypeEmoji),
        "custom_emoji" => CustomEmoji(ReactionTypeCustomEmoji),
        "paid" => Paid(ReactionTypePaid),
    }
}

impl ReactionType {
    /// Shorthand for an emoji reaction.
    pub fn emoji(emoji: impl Into<String>) -> Self {
        Self::Emoji(ReactionTypeEmoji {
            emoji: emoji.into(),
        })
    }
}

// =============================================================================
// Message
// =============================================================================

/// A message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message_id")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_chat: Option<Chat>,
    #[serde(default)]
    pub date: i64,
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_origin: Option<MessageOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo: Vec<PhotoSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Audio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Video>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<Voice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_media: Option<PaidMediaInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_chat_members: Vec<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_chat_member: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_background_set: Option<ChatBackground>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful_payment: Option<SuccessfulPayment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl Message {
    /// Text or caption, whichever is present.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Returns the `/command` this message starts with, without the bot
    /// mention suffix.
    pub fn command(&self) -> Option<&str> {
        let entity = self.entities.first()?;
        if entity.kind != "bot_command" || entity.offset != 0 {
            return None;
        }
        let text = self.text.as_deref()?;
        let word = text.split_whitespace().next()?;
        Some(word.split('@').next().unwrap_or(word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_decodes_minimal_envelope_result() {
        let json = r#"{"message_id":7,"chat":{"id":100,"type":"private"},"text":"hi"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.id, 7);
        assert_eq!(message.chat.id, 100);
        assert!(message.chat.is_private());
        assert_eq!(message.text_or_caption(), Some("hi"));
    }

    #[test]
    fn test_forward_origin() {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 5,
            "chat": {"id": 1, "type": "group", "title": "g"},
            "forward_origin": {"type": "hidden_user", "date": 4, "sender_user_name": "ghost"}
        });
        let message: Message = serde_json::from_value(json).unwrap();
        assert!(matches!(
            message.forward_origin,
            Some(MessageOrigin::HiddenUser(ref origin)) if origin.sender_user_name == "ghost"
        ));
    }

    #[test]
    fn test_command_extraction() {
        let json = serde_json::json!({
            "message_id": 1,
            "chat": {"id": 1, "type": "private"},
            "text": "/start@my_bot payload",
            "entities": [{"type": "bot_command", "offset": 0, "length": 13}]
        });
        let message: Message = serde_json::from_value(json).unwrap();
        assert_eq!(message.command(), Some("/start"));
    }

    #[test]
    fn test_paid_reaction_has_no_body() {
        let reaction = ReactionType::Paid(ReactionTypePaid {});
        assert_eq!(serde_json::to_string(&reaction).unwrap(), r#"{"type":"paid"}"#);
        assert_eq!(
            serde_json::to_string(&ReactionType::emoji("👍")).unwrap(),
            r#"{"type":"emoji","emoji":"👍"}"#
        );
    }
}
