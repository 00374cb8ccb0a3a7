use tgbot_macros::Params;

use crate::api::impl_method;
use crate::types::{BotCommand, BotCommandScope, File, MenuButton, User};

/// Returns the bot's own user.
#[derive(Debug, Clone, Copy, Default, Params)]
pub struct GetMe;

#[derive(Debug, Clone, Params)]
pub struct SetMyCommands {
    #[tg(force)]
    pub commands: Vec<BotCommand>,
    pub scope: Option<BotCommandScope>,
    pub language_code: Option<String>,
}

impl SetMyCommands {
    pub fn new(commands: impl IntoIterator<Item = BotCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            scope: None,
            language_code: None,
        }
    }

    pub fn scope(mut self, scope: impl Into<BotCommandScope>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

#[derive(Debug, Clone, Default, Params)]
pub struct SetChatMenuButton {
    pub chat_id: Option<i64>,
    pub menu_button: Option<MenuButton>,
}

/// Prepares a file for download.
#[derive(Debug, Clone, Params)]
pub struct GetFile {
    pub file_id: String,
}

impl GetFile {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
        }
    }
}

impl_method! {
    GetMe => "getMe": User,
    SetMyCommands => "setMyCommands": bool,
    SetChatMenuButton => "setChatMenuButton": bool,
    GetFile => "getFile": File,
}
