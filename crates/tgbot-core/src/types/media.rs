//! Received media, backgrounds, paid media and story areas.

use serde::{Deserialize, Serialize};

use crate::types::{ReactionType, User};

// =============================================================================
// Files
// =============================================================================

/// One size of a photo or thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// A general file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PhotoSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PhotoSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audio {
    pub file_id: String,
    pub file_unique_id: String,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub file_id: String,
    pub file_unique_id: String,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// A file ready to be downloaded, as returned by `getFile`.
///
/// Pass [`file_path`](File::file_path) to
/// [`Context::download`](crate::Context::download).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

// =============================================================================
// Backgrounds
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundFillSolid {
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundFillGradient {
    pub top_color: u32,
    pub bottom_color: u32,
    pub rotation_angle: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundFillFreeformGradient {
    pub colors: Vec<u32>,
}

crate::variant_family! {
    /// How a background is filled, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum BackgroundFill: "type" {
        "solid" => Solid(BackgroundFillSolid),
        "gradient" => Gradient(BackgroundFillGradient),
        "freeform_gradient" => FreeformGradient(BackgroundFillFreeformGradient),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTypeFill {
    pub fill: BackgroundFill,
    pub dark_theme_dimming: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTypeWallpaper {
    pub document: Document,
    pub dark_theme_dimming: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_blurred: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTypePattern {
    pub document: Document,
    pub fill: BackgroundFill,
    pub intensity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_inverted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_moving: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTypeChatTheme {
    pub theme_name: String,
}

crate::variant_family! {
    /// Kind of a chat background, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum BackgroundType: "type" {
        "fill" => Fill(BackgroundTypeFill),
        "wallpaper" => Wallpaper(BackgroundTypeWallpaper),
        "pattern" => Pattern(BackgroundTypePattern),
        "chat_theme" => ChatTheme(BackgroundTypeChatTheme),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBackground {
    #[serde(rename = "type")]
    pub kind: BackgroundType,
}

// =============================================================================
// Paid media
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaPreview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaPhoto {
    pub photo: Vec<PhotoSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaVideo {
    pub video: Video,
}

crate::variant_family! {
    /// Media behind a paywall, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum PaidMedia: "type" {
        "preview" => Preview(PaidMediaPreview),
        "photo" => Photo(PaidMediaPhoto),
        "video" => Video(PaidMediaVideo),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaInfo {
    pub star_count: i64,
    pub paid_media: Vec<PaidMedia>,
}

/// A user bought paid media sent by the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaPurchased {
    pub from: User,
    pub paid_media_payload: String,
}

// =============================================================================
// Story areas
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAreaPosition {
    pub x_percentage: f64,
    pub y_percentage: f64,
    pub width_percentage: f64,
    pub height_percentage: f64,
    pub rotation_angle: f64,
    pub corner_radius_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAddress {
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAreaTypeLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<LocationAddress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAreaTypeSuggestedReaction {
    pub reaction_type: ReactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_dark: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_flipped: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAreaTypeLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAreaTypeWeather {
    pub temperature: f64,
    pub emoji: String,
    pub background_color: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAreaTypeUniqueGift {
    pub name: String,
}

crate::variant_family! {
    /// Clickable area on a story, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum StoryAreaType: "type" {
        "location" => Location(StoryAreaTypeLocation),
        "suggested_reaction" => SuggestedReaction(StoryAreaTypeSuggestedReaction),
        "link" => Link(StoryAreaTypeLink),
        "weather" => Weather(StoryAreaTypeWeather),
        "unique_gift" => UniqueGift(StoryAreaTypeUniqueGift),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryArea {
    pub position: StoryAreaPosition,
    #[serde(rename = "type")]
    pub kind: StoryAreaType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_families_decode() {
        let json = serde_json::json!({
            "type": {
                "type": "fill",
                "fill": {"type": "gradient", "top_color": 1, "bottom_color": 2, "rotation_angle": 45},
                "dark_theme_dimming": 20
            }
        });
        let background: ChatBackground = serde_json::from_value(json.clone()).unwrap();
        let BackgroundType::Fill(fill) = &background.kind else {
            panic!("expected fill background");
        };
        assert_eq!(fill.fill.kind(), "gradient");
        assert_eq!(serde_json::to_value(&background).unwrap(), json);
    }

    #[test]
    fn test_story_area_encodes_discriminator() {
        let area = StoryAreaType::Link(StoryAreaTypeLink {
            url: "https://t.me".into(),
        });
        assert_eq!(
            serde_json::to_string(&area).unwrap(),
            r#"{"type":"link","url":"https://t.me"}"#
        );
    }

    #[test]
    fn test_paid_media_round_trip() {
        let media = PaidMedia::Preview(PaidMediaPreview {
            width: Some(10),
            height: None,
            duration: None,
        });
        let text = serde_json::to_string(&media).unwrap();
        assert_eq!(text, r#"{"type":"preview","width":10}"#);
        assert_eq!(serde_json::from_str::<PaidMedia>(&text).unwrap(), media);
    }
}
