//! Users, chats and membership.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::payload::{ParamValue, Payload};
use crate::types::ReactionType;

// =============================================================================
// Identifiers
// =============================================================================

/// Target chat: a numeric identifier or a `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    /// Numeric chat identifier.
    Id(i64),
    /// Public username in the form `@channelusername`.
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(name: &str) -> Self {
        Self::Username(name.to_string())
    }
}

impl From<String> for ChatId {
    fn from(name: String) -> Self {
        Self::Username(name)
    }
}

impl ParamValue for ChatId {
    fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
        match self {
            Self::Id(id) => id.write_param(key, force, payload),
            Self::Username(name) => name.write_param(key, force, payload),
        }
    }
}

// =============================================================================
// Users and chats
// =============================================================================

/// A user or bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    /// Only returned by `getMe`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_join_groups: Option<bool>,
    /// Only returned by `getMe`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_inline_queries: Option<bool>,
}

/// Kind of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// A chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_forum: Option<bool>,
}

impl Chat {
    /// Returns `true` for one-to-one chats.
    pub fn is_private(&self) -> bool {
        self.kind == ChatType::Private
    }
}

/// Actions a member is allowed to take.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatPermissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_photos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_polls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_send_other_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_invite_users: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_pin_messages: Option<bool>,
}

/// An invite link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInviteLink {
    pub invite_link: String,
    pub creator: User,
    pub creates_join_request: bool,
    pub is_primary: bool,
    pub is_revoked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<i64>,
}

// =============================================================================
// Chat members
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberOwner {
    pub user: User,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberAdministrator {
    pub user: User,
    pub can_be_edited: bool,
    pub is_anonymous: bool,
    pub can_manage_chat: bool,
    pub can_delete_messages: bool,
    pub can_restrict_members: bool,
    pub can_promote_members: bool,
    pub can_change_info: bool,
    pub can_invite_users: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberMember {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_date: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberRestricted {
    pub user: User,
    pub is_member: bool,
    #[serde(flatten)]
    pub permissions: ChatPermissions,
    pub until_date: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberLeft {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberBanned {
    pub user: User,
    /// `0` means banned forever.
    pub until_date: i64,
}

crate::variant_family! {
    /// Membership of a user in a chat, keyed by `status`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum ChatMember: "status" {
        "creator" => Owner(ChatMemberOwner),
        "administrator" => Administrator(ChatMemberAdministrator),
        "member" => Member(ChatMemberMember),
        "restricted" => Restricted(ChatMemberRestricted),
        "left" => Left(ChatMemberLeft),
        "kicked" => Banned(ChatMemberBanned),
    }
}

impl ChatMember {
    /// The member.
    pub fn user(&self) -> &User {
        match self {
            Self::Owner(m) => &m.user,
            Self::Administrator(m) => &m.user,
            Self::Member(m) => &m.user,
            Self::Restricted(m) => &m.user,
            Self::Left(m) => &m.user,
            Self::Banned(m) => &m.user,
        }
    }

    /// Returns `true` if the user is currently in the chat.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Owner(_) | Self::Administrator(_) | Self::Member(_) => true,
            Self::Restricted(m) => m.is_member,
            Self::Left(_) | Self::Banned(_) => false,
        }
    }
}

/// A change of a member's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<ChatInviteLink>,
}

/// A request to join a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    pub user_chat_id: i64,
    pub date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_link: Option<ChatInviteLink>,
}

// =============================================================================
// Boosts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostSourcePremium {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostSourceGiftCode {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostSourceGiveaway {
    pub giveaway_message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize_star_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unclaimed: Option<bool>,
}

crate::variant_family! {
    /// Origin of a boost, keyed by `source`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum ChatBoostSource: "source" {
        "premium" => Premium(ChatBoostSourcePremium),
        "gift_code" => GiftCode(ChatBoostSourceGiftCode),
        "giveaway" => Giveaway(ChatBoostSourceGiveaway),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoost {
    pub boost_id: String,
    pub add_date: i64,
    pub expiration_date: i64,
    pub source: ChatBoostSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostUpdated {
    pub chat: Chat,
    pub boost: ChatBoost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostRemoved {
    pub chat: Chat,
    pub boost_id: String,
    pub remove_date: i64,
    pub source: ChatBoostSource,
}

// =============================================================================
// Business accounts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConnection {
    pub id: String,
    pub user: User,
    pub user_chat_id: i64,
    pub date: i64,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessMessagesDeleted {
    pub business_connection_id: String,
    pub chat: Chat,
    pub message_ids: Vec<i64>,
}

// =============================================================================
// Reactions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReactionUpdated {
    pub chat: Chat,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_chat: Option<Chat>,
    pub date: i64,
    #[serde(default)]
    pub old_reaction: Vec<ReactionType>,
    #[serde(default)]
    pub new_reaction: Vec<ReactionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionCount {
    #[serde(rename = "type")]
    pub kind: ReactionType,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReactionCountUpdated {
    pub chat: Chat,
    pub message_id: i64,
    pub date: i64,
    #[serde(default)]
    pub reactions: Vec<ReactionCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json() -> serde_json::Value {
        serde_json::json!({"id": 7, "is_bot": false, "first_name": "Ann"})
    }

    #[test]
    fn test_chat_member_decodes_by_status() {
        let json = serde_json::json!({"status": "kicked", "user": user_json(), "until_date": 0});
        let member: ChatMember = serde_json::from_value(json).unwrap();
        assert_eq!(member.kind(), "kicked");
        assert!(!member.is_present());
        assert_eq!(member.user().first_name, "Ann");
    }

    #[test]
    fn test_chat_member_reencode_keeps_key_set() {
        let json = serde_json::json!({
            "status": "restricted",
            "user": user_json(),
            "is_member": true,
            "can_send_messages": false,
            "until_date": 1700000000
        });
        let member: ChatMember = serde_json::from_value(json.clone()).unwrap();
        let encoded = serde_json::to_value(&member).unwrap();
        let keys = |v: &serde_json::Value| {
            let mut keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
            keys.sort();
            keys
        };
        assert_eq!(keys(&encoded), keys(&json));
        assert_eq!(encoded["status"], "restricted");
    }

    #[test]
    fn test_boost_source_unknown_id() {
        let json = serde_json::json!({"source": "lottery"});
        let err = serde_json::from_value::<ChatBoostSource>(json).unwrap_err();
        assert!(err.to_string().contains("`lottery`"));
    }

    #[test]
    fn test_chat_id_param() {
        let payload = Payload::new()
            .with("chat_id", ChatId::from(-1001))
            .with("from_chat_id", ChatId::from("@news"))
            .with("zero", ChatId::Id(0));
        assert_eq!(payload.get("chat_id"), Some("-1001"));
        assert_eq!(payload.get("from_chat_id"), Some("@news"));
        assert_eq!(payload.get("zero"), None);
    }
}
