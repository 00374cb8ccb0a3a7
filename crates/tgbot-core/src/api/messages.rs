use tgbot_macros::Params;

use crate::api::impl_method;
use crate::file::InputFile;
use crate::types::{
    ChatId, InlineKeyboardMarkup, InputMedia, InputPollOption, LinkPreviewOptions, Message,
    MessageEntity, ParseMode, Poll, ReplyMarkup, ReplyParameters,
};

#[derive(Debug, Clone, Params)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub message_thread_id: Option<i64>,
    pub business_connection_id: Option<String>,
    #[tg(force)]
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub entities: Vec<MessageEntity>,
    pub link_preview_options: Option<LinkPreviewOptions>,
    pub disable_notification: bool,
    pub protect_content: bool,
    pub reply_parameters: Option<ReplyParameters>,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_thread_id: None,
            business_connection_id: None,
            text: text.into(),
            parse_mode: None,
            entities: Vec::new(),
            link_preview_options: None,
            disable_notification: false,
            protect_content: false,
            reply_parameters: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_parameters = Some(ReplyParameters::new(message_id));
        self
    }

    pub fn reply_markup(mut self, markup: impl Into<ReplyMarkup>) -> Self {
        self.reply_markup = Some(markup.into());
        self
    }
}

#[derive(Debug, Params)]
pub struct SendPhoto {
    pub chat_id: ChatId,
    pub photo: InputFile,
    pub caption: Option<String>,
    pub parse_mode: Option<ParseMode>,
    pub caption_entities: Vec<MessageEntity>,
    pub has_spoiler: bool,
    pub disable_notification: bool,
    pub reply_parameters: Option<ReplyParameters>,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendPhoto {
    pub fn new(chat_id: impl Into<ChatId>, photo: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            photo,
            caption: None,
            parse_mode: None,
            caption_entities: Vec::new(),
            has_spoiler: false,
            disable_notification: false,
            reply_parameters: None,
            reply_markup: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

#[derive(Debug, Params)]
pub struct SendDocument {
    pub chat_id: ChatId,
    pub document: InputFile,
    pub thumbnail: Option<InputFile>,
    pub caption: Option<String>,
    pub parse_mode: Option<ParseMode>,
    pub disable_content_type_detection: bool,
    pub disable_notification: bool,
    pub reply_parameters: Option<ReplyParameters>,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendDocument {
    pub fn new(chat_id: impl Into<ChatId>, document: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            document,
            thumbnail: None,
            caption: None,
            parse_mode: None,
            disable_content_type_detection: false,
            disable_notification: false,
            reply_parameters: None,
            reply_markup: None,
        }
    }
}

/// Sends 2-10 media as an album.
#[derive(Debug, Params)]
pub struct SendMediaGroup {
    pub chat_id: ChatId,
    #[tg(input)]
    pub media: Vec<InputMedia>,
    pub disable_notification: bool,
    pub reply_parameters: Option<ReplyParameters>,
}

impl SendMediaGroup {
    pub fn new(chat_id: impl Into<ChatId>, media: impl IntoIterator<Item = InputMedia>) -> Self {
        Self {
            chat_id: chat_id.into(),
            media: media.into_iter().collect(),
            disable_notification: false,
            reply_parameters: None,
        }
    }
}

/// Edits a text message, either in a chat or sent in inline mode.
#[derive(Debug, Clone, Params)]
pub struct EditMessageText {
    pub chat_id: Option<ChatId>,
    pub message_id: Option<i64>,
    pub inline_message_id: Option<String>,
    #[tg(force)]
    pub text: String,
    pub parse_mode: Option<ParseMode>,
    pub entities: Vec<MessageEntity>,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageText {
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            message_id: Some(message_id),
            inline_message_id: None,
            text: text.into(),
            parse_mode: None,
            entities: Vec::new(),
            reply_markup: None,
        }
    }

    pub fn inline(inline_message_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: None,
            message_id: None,
            inline_message_id: Some(inline_message_id.into()),
            text: text.into(),
            parse_mode: None,
            entities: Vec::new(),
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct DeleteMessage {
    pub chat_id: ChatId,
    pub message_id: i64,
}

impl DeleteMessage {
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct SendPoll {
    pub chat_id: ChatId,
    pub question: String,
    pub options: Vec<InputPollOption>,
    #[tg(force)]
    pub is_anonymous: bool,
    #[tg(rename = "type")]
    pub kind: Option<String>,
    pub allows_multiple_answers: bool,
    pub correct_option_id: Option<u32>,
    pub open_period: u32,
    pub disable_notification: bool,
    pub reply_markup: Option<ReplyMarkup>,
}

impl SendPoll {
    pub fn new(
        chat_id: impl Into<ChatId>,
        question: impl Into<String>,
        options: impl IntoIterator<Item = InputPollOption>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            question: question.into(),
            options: options.into_iter().collect(),
            is_anonymous: true,
            kind: None,
            allows_multiple_answers: false,
            correct_option_id: None,
            open_period: 0,
            disable_notification: false,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct StopPoll {
    pub chat_id: ChatId,
    pub message_id: i64,
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl_method! {
    SendMessage => "sendMessage": Message,
    SendPhoto => "sendPhoto": Message,
    SendDocument => "sendDocument": Message,
    SendMediaGroup => "sendMediaGroup": Vec<Message>,
    EditMessageText => "editMessageText": serde_json::Value,
    DeleteMessage => "deleteMessage": bool,
    SendPoll => "sendPoll": Message,
    StopPoll => "stopPoll": Poll,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::payload::{IntoParams, Payload};
    use crate::testing::MockClient;
    use crate::types::{InlineKeyboardButton, InputMediaPhoto};

    fn params(record: impl IntoParams) -> Payload {
        let mut payload = Payload::new();
        record.write_params(&mut payload);
        payload
    }

    #[test]
    fn test_send_message_skips_defaults() {
        let payload = params(SendMessage::new(100, "hi"));
        assert_eq!(payload.params().len(), 2);
        assert_eq!(payload.get("chat_id"), Some("100"));
        assert_eq!(payload.get("text"), Some("hi"));
    }

    #[test]
    fn test_send_message_options() {
        let markup = InlineKeyboardMarkup::new([vec![InlineKeyboardButton::callback("Ok", "ok")]]);
        let payload = params(
            SendMessage::new("@news", "<b>hi</b>")
                .parse_mode(ParseMode::Html)
                .reply_to(3)
                .reply_markup(markup),
        );
        assert_eq!(payload.get("chat_id"), Some("@news"));
        assert_eq!(payload.get("parse_mode"), Some("HTML"));
        assert_eq!(payload.get("reply_parameters"), Some(r#"{"message_id":3}"#));
        assert_eq!(
            payload.get("reply_markup"),
            Some(r#"{"inline_keyboard":[[{"text":"Ok","callback_data":"ok"}]]}"#)
        );
    }

    #[test]
    fn test_send_poll_forces_anonymity_flag() {
        let mut poll = SendPoll::new(1, "Lunch?", [InputPollOption::from("Pizza"), InputPollOption::from("Sushi")]);
        poll.is_anonymous = false;
        poll.kind = Some("regular".into());
        let payload = params(poll);
        assert_eq!(payload.get("is_anonymous"), Some("false"));
        assert_eq!(payload.get("type"), Some("regular"));
        assert_eq!(payload.get("options"), Some(r#"[{"text":"Pizza"},{"text":"Sushi"}]"#));
    }

    #[tokio::test]
    async fn test_send_media_group_uploads_as_attachments() {
        let client = MockClient::new();
        client.respond_ok(json!([
            {"message_id": 1, "chat": {"id": 5, "type": "private"}},
            {"message_id": 2, "chat": {"id": 5, "type": "private"}}
        ]));
        let ctx = client.bot().context();

        let media = [
            InputMedia::from(InputMediaPhoto::new(InputFile::bytes("a.jpg", vec![1, 2, 3]))),
            InputMedia::from(InputMediaPhoto::new(InputFile::id("AgAD"))),
        ];
        let sent = ctx.execute(SendMediaGroup::new(5, media)).await.unwrap();
        assert_eq!(sent.len(), 2);

        let request = client.last().unwrap();
        assert!(request.is_multipart());
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains(r#"[{"type":"photo","media":"attach://attach-0"},{"type":"photo","media":"AgAD"}]"#));
        assert!(body.contains("name=\"attach-0\"; filename=\"a.jpg\""));
    }
}
