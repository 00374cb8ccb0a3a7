//! Polls.

use serde::{Deserialize, Serialize};

use crate::types::{Chat, MessageEntity, ParseMode, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    pub voter_count: u32,
}

/// Option of a poll to be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPollOption {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_parse_mode: Option<ParseMode>,
}

impl From<&str> for InputPollOption {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
            text_parse_mode: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_voter_count: u32,
    pub is_closed: bool,
    pub is_anonymous: bool,
    /// `regular` or `quiz`.
    #[serde(rename = "type")]
    pub kind: String,
    pub allows_multiple_answers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explanation_entities: Vec<MessageEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<i64>,
}

/// A vote in a non-anonymous poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voter_chat: Option<Chat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Empty when the vote was retracted.
    #[serde(default)]
    pub option_ids: Vec<u32>,
}
