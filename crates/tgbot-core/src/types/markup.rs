//! Keyboards, commands and menu buttons.

use serde::{Deserialize, Serialize};

use crate::types::ChatId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppInfo {
    pub url: String,
}

/// A button of an inline keyboard.
///
/// Exactly one of the optional fields must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_inline_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_inline_query_current_chat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay: Option<bool>,
}

impl InlineKeyboardButton {
    /// A button that sends `data` back in a callback query.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            ..Default::default()
        }
    }

    /// A button that opens `url`.
    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

/// A keyboard attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new(rows: impl IntoIterator<Item = Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_contact: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_location: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_persistent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time_keyboard: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
}

impl Default for ReplyKeyboardRemove {
    fn default() -> Self {
        Self {
            remove_keyboard: true,
            selective: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceReply {
    pub force_reply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_field_placeholder: Option<String>,
}

/// Any of the reply markups accepted by `reply_markup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard(InlineKeyboardMarkup),
    Keyboard(ReplyKeyboardMarkup),
    Remove(ReplyKeyboardRemove),
    ForceReply(ForceReply),
}

impl From<InlineKeyboardMarkup> for ReplyMarkup {
    fn from(markup: InlineKeyboardMarkup) -> Self {
        Self::InlineKeyboard(markup)
    }
}

impl From<ReplyKeyboardMarkup> for ReplyMarkup {
    fn from(markup: ReplyKeyboardMarkup) -> Self {
        Self::Keyboard(markup)
    }
}

impl From<ReplyKeyboardRemove> for ReplyMarkup {
    fn from(markup: ReplyKeyboardRemove) -> Self {
        Self::Remove(markup)
    }
}

impl From<ForceReply> for ReplyMarkup {
    fn from(markup: ForceReply) -> Self {
        Self::ForceReply(markup)
    }
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDefault {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAllPrivateChats {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAllGroupChats {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAllChatAdministrators {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeChat {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeChatAdministrators {
    pub chat_id: ChatId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeChatMember {
    pub chat_id: ChatId,
    pub user_id: i64,
}

crate::variant_family! {
    /// Users a command list applies to, keyed by `type`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BotCommandScope: "type" {
        "default" => Default(ScopeDefault),
        "all_private_chats" => AllPrivateChats(ScopeAllPrivateChats),
        "all_group_chats" => AllGroupChats(ScopeAllGroupChats),
        "all_chat_administrators" => AllChatAdministrators(ScopeAllChatAdministrators),
        "chat" => Chat(ScopeChat),
        "chat_administrators" => ChatAdministrators(ScopeChatAdministrators),
        "chat_member" => ChatMember(ScopeChatMember),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButtonCommands {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButtonWebApp {
    pub text: String,
    pub web_app: WebAppInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButtonDefault {}

crate::variant_family! {
    /// The bot's menu button in a private chat, keyed by `type`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MenuButton: "type" {
        "commands" => Commands(MenuButtonCommands),
        "web_app" => WebApp(MenuButtonWebApp),
        "default" => Default(MenuButtonDefault),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_markup_is_untagged() {
        let markup: ReplyMarkup =
            InlineKeyboardMarkup::new([vec![InlineKeyboardButton::callback("Yes", "y")]]).into();
        assert_eq!(
            serde_json::to_string(&markup).unwrap(),
            r#"{"inline_keyboard":[[{"text":"Yes","callback_data":"y"}]]}"#
        );
        assert_eq!(
            serde_json::to_string(&ReplyMarkup::from(ReplyKeyboardRemove::default())).unwrap(),
            r#"{"remove_keyboard":true}"#
        );
    }

    #[test]
    fn test_command_scope() {
        let scope = BotCommandScope::ChatMember(ScopeChatMember {
            chat_id: ChatId::Id(-5),
            user_id: 9,
        });
        let text = serde_json::to_string(&scope).unwrap();
        assert_eq!(text, r#"{"type":"chat_member","chat_id":-5,"user_id":9}"#);
        assert_eq!(serde_json::from_str::<BotCommandScope>(&text).unwrap(), scope);
        assert_eq!(
            serde_json::to_string(&BotCommandScope::Default(ScopeDefault {})).unwrap(),
            r#"{"type":"default"}"#
        );
    }

    #[test]
    fn test_menu_button_decode() {
        let button: MenuButton = serde_json::from_str(r#"{"type":"commands"}"#).unwrap();
        assert_eq!(button, MenuButton::Commands(MenuButtonCommands {}));
    }
}
