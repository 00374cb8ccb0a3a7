//! Outgoing structured values: input media, inline results and passport
//! element errors.
//!
//! These types are only ever sent, so their unions are declared with
//! [`encode_variants!`](crate::encode_variants). Types that can carry local
//! uploads implement [`InputObject`]; pass them through
//! [`Payload::set_input`](crate::Payload::set_input) (or a `#[tg(input)]`
//! field) so every upload becomes an `attach://` part.

use serde::Serialize;

use crate::file::InputFile;
use crate::payload::{InputObject, Payload};
use crate::types::{InlineKeyboardMarkup, LinkPreviewOptions, MessageEntity, ParseMode};

// =============================================================================
// Input media
// =============================================================================

#[derive(Debug, Serialize)]
pub struct InputMediaPhoto {
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
}

impl InputMediaPhoto {
    pub fn new(media: InputFile) -> Self {
        Self {
            media,
            caption: None,
            parse_mode: None,
            caption_entities: Vec::new(),
            has_spoiler: None,
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct InputMediaVideo {
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
}

impl InputMediaVideo {
    pub fn new(media: InputFile) -> Self {
        Self {
            media,
            thumbnail: None,
            caption: None,
            parse_mode: None,
            width: None,
            height: None,
            duration: None,
            supports_streaming: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InputMediaAnimation {
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Serialize)]
pub struct InputMediaAudio {
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InputMediaDocument {
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_content_type_detection: Option<bool>,
}

impl InputMediaDocument {
    pub fn new(media: InputFile) -> Self {
        Self {
            media,
            thumbnail: None,
            caption: None,
            disable_content_type_detection: None,
        }
    }
}

crate::encode_variants! {
    /// Content of a media message to be sent, keyed by `type`.
    #[derive(Debug)]
    pub enum InputMedia: "type" {
        "photo" => Photo(InputMediaPhoto),
        "video" => Video(InputMediaVideo),
        "animation" => Animation(InputMediaAnimation),
        "audio" => Audio(InputMediaAudio),
        "document" => Document(InputMediaDocument),
    }
}

impl InputObject for InputMediaPhoto {
    fn attach_files(&mut self, payload: &mut Payload) {
        self.media.attach_files(payload);
    }
}

macro_rules! impl_media_with_thumbnail {
    ($($ty:ty),* $(,)?) => {
        $(
            impl InputObject for $ty {
                fn attach_files(&mut self, payload: &mut Payload) {
                    self.media.attach_files(payload);
                    self.thumbnail.attach_files(payload);
                }
            }
        )*
    };
}

impl_media_with_thumbnail!(
    InputMediaVideo,
    InputMediaAnimation,
    InputMediaAudio,
    InputMediaDocument,
    InputPaidMediaVideo,
);

impl InputObject for InputMedia {
    fn attach_files(&mut self, payload: &mut Payload) {
        match self {
            Self::Photo(media) => media.attach_files(payload),
            Self::Video(media) => media.attach_files(payload),
            Self::Animation(media) => media.attach_files(payload),
            Self::Audio(media) => media.attach_files(payload),
            Self::Document(media) => media.attach_files(payload),
        }
    }
}

// =============================================================================
// Paid media
// =============================================================================

#[derive(Debug, Serialize)]
pub struct InputPaidMediaPhoto {
    pub media: InputFile,
}

#[derive(Debug, Serialize)]
pub struct InputPaidMediaVideo {
    pub media: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
}

crate::encode_variants! {
    /// Paid media to be sent, keyed by `type`.
    #[derive(Debug)]
    pub enum InputPaidMedia: "type" {
        "photo" => Photo(InputPaidMediaPhoto),
        "video" => Video(InputPaidMediaVideo),
    }
}

impl InputObject for InputPaidMedia {
    fn attach_files(&mut self, payload: &mut Payload) {
        match self {
            Self::Photo(media) => media.media.attach_files(payload),
            Self::Video(media) => media.attach_files(payload),
        }
    }
}

// =============================================================================
// Inline query results
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputTextMessageContent {
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_preview_options: Option<LinkPreviewOptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputLocationMessageContent {
    pub latitude: f64,
    pub longitude: f64,
}

/// Content sent when an inline result is chosen; the kind is inferred from
/// the fields present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputMessageContent {
    Text(InputTextMessageContent),
    Location(InputLocationMessageContent),
}

impl InputMessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(InputTextMessageContent {
            message_text: text.into(),
            parse_mode: None,
            entities: Vec::new(),
            link_preview_options: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQueryResultArticle {
    pub id: String,
    pub title: String,
    pub input_message_content: InputMessageContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl InlineQueryResultArticle {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: InputMessageContent,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            input_message_content: content,
            reply_markup: None,
            url: None,
            description: None,
            thumbnail_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQueryResultPhoto {
    pub id: String,
    pub photo_url: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQueryResultGif {
    pub id: String,
    pub gif_url: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineQueryResultLocation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_period: Option<u32>,
}

crate::encode_variants! {
    /// One result of an inline query, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum InlineQueryResult: "type" {
        "article" => Article(InlineQueryResultArticle),
        "photo" => Photo(InlineQueryResultPhoto),
        "gif" => Gif(InlineQueryResultGif),
        "location" => Location(InlineQueryResultLocation),
    }
}

// =============================================================================
// Passport element errors
// =============================================================================

/// An error in a field of a passport element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassportElementErrorDataField {
    /// Element type, e.g. `passport`.
    #[serde(rename = "type")]
    pub element: String,
    pub field_name: String,
    pub data_hash: String,
    pub message: String,
}

macro_rules! passport_file_errors {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Serialize)]
            pub struct $name {
                #[serde(rename = "type")]
                pub element: String,
                pub file_hash: String,
                pub message: String,
            }
        )*
    };
}

passport_file_errors!(
    PassportElementErrorFrontSide,
    PassportElementErrorReverseSide,
    /// An error in the selfie with the document.
    PassportElementErrorSelfie,
    /// An error in an uploaded document scan.
    PassportElementErrorFile,
);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassportElementErrorUnspecified {
    #[serde(rename = "type")]
    pub element: String,
    pub element_hash: String,
    pub message: String,
}

crate::encode_variants! {
    /// An error reported back for submitted passport data, keyed by `source`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum PassportElementError: "source" {
        "data" => DataField(PassportElementErrorDataField),
        "front_side" => FrontSide(PassportElementErrorFrontSide),
        "reverse_side" => ReverseSide(PassportElementErrorReverseSide),
        "selfie" => Selfie(PassportElementErrorSelfie),
        "file" => File(PassportElementErrorFile),
        "unspecified" => Unspecified(PassportElementErrorUnspecified),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_media_attaches_upload_and_thumbnail() {
        let mut payload = Payload::new();
        let mut video = InputMediaVideo::new(InputFile::bytes("clip.mp4", vec![0; 4]));
        video.thumbnail = Some(InputFile::bytes("thumb.jpg", vec![1; 4]));
        let media = vec![
            InputMedia::from(video),
            InputMedia::from(InputMediaPhoto::new(InputFile::id("AgAD")).caption("hi")),
        ];
        payload.set_input("media", media);

        let json: serde_json::Value = serde_json::from_str(payload.get("media").unwrap()).unwrap();
        assert_eq!(json[0]["type"], "video");
        assert_eq!(json[0]["media"], "attach://attach-0");
        assert_eq!(json[0]["thumbnail"], "attach://attach-1");
        assert_eq!(json[1]["type"], "photo");
        assert_eq!(json[1]["media"], "AgAD");
        assert_eq!(json[1]["caption"], "hi");
        assert!(payload.file("attach-0").is_some());
        assert!(payload.file("attach-1").is_some());
    }

    #[test]
    fn test_inline_result_article() {
        let result = InlineQueryResult::from(InlineQueryResultArticle::new(
            "1",
            "Echo",
            InputMessageContent::text("hello"),
        ));
        assert_eq!(result.kind(), "article");
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"type":"article","id":"1","title":"Echo","input_message_content":{"message_text":"hello"}}"#
        );
    }

    #[test]
    fn test_paid_media_photo() {
        let mut payload = Payload::new();
        payload.set_input(
            "media",
            vec![InputPaidMedia::Photo(InputPaidMediaPhoto {
                media: InputFile::bytes("p.jpg", vec![1]),
            })],
        );
        assert_eq!(
            payload.get("media"),
            Some(r#"[{"type":"photo","media":"attach://attach-0"}]"#)
        );
    }

    #[test]
    fn test_passport_error_keeps_element_type() {
        let error = PassportElementError::from(PassportElementErrorSelfie {
            element: "passport".into(),
            file_hash: "abc".into(),
            message: "blurry".into(),
        });
        assert_eq!(error.kind(), "selfie");
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"source":"selfie","type":"passport","file_hash":"abc","message":"blurry"}"#
        );
    }
}
