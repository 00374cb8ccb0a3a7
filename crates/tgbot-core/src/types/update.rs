//! Incoming updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{
    BusinessConnection, BusinessMessagesDeleted, CallbackQuery, ChatBoostRemoved,
    ChatBoostUpdated, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery,
    Message, MessageReactionCountUpdated, MessageReactionUpdated, PaidMediaPurchased, Poll,
    PollAnswer, PreCheckoutQuery, ShippingQuery,
};

macro_rules! update_kinds {
    ($( $variant:ident => $name:literal ),* $(,)?) => {
        /// Kind of an update, named like its field.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum UpdateKind {
            $( $variant, )*
        }

        impl UpdateKind {
            /// Every kind, in field order.
            pub const ALL: &'static [UpdateKind] = &[$( UpdateKind::$variant, )*];

            /// Field name of this kind.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }
        }
    };
}

update_kinds! {
    Message => "message",
    EditedMessage => "edited_message",
    ChannelPost => "channel_post",
    EditedChannelPost => "edited_channel_post",
    BusinessConnection => "business_connection",
    BusinessMessage => "business_message",
    EditedBusinessMessage => "edited_business_message",
    DeletedBusinessMessages => "deleted_business_messages",
    MessageReaction => "message_reaction",
    MessageReactionCount => "message_reaction_count",
    InlineQuery => "inline_query",
    ChosenInlineResult => "chosen_inline_result",
    CallbackQuery => "callback_query",
    ShippingQuery => "shipping_query",
    PreCheckoutQuery => "pre_checkout_query",
    PurchasedPaidMedia => "purchased_paid_media",
    Poll => "poll",
    PollAnswer => "poll_answer",
    MyChatMember => "my_chat_member",
    ChatMember => "chat_member",
    ChatJoinRequest => "chat_join_request",
    ChatBoost => "chat_boost",
    RemovedChatBoost => "removed_chat_boost",
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming update.
///
/// At most one of the optional fields is set; it identifies the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(rename = "update_id")]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_channel_post: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_connection: Option<BusinessConnection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_business_message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_business_messages: Option<BusinessMessagesDeleted>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reaction: Option<MessageReactionUpdated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reaction_count: Option<MessageReactionCountUpdated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_query: Option<InlineQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_inline_result: Option<ChosenInlineResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_query: Option<ShippingQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_checkout_query: Option<PreCheckoutQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased_paid_media: Option<PaidMediaPurchased>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_answer: Option<PollAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_chat_member: Option<ChatMemberUpdated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_member: Option<ChatMemberUpdated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_join_request: Option<ChatJoinRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_boost: Option<ChatBoostUpdated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_chat_boost: Option<ChatBoostRemoved>,
}

impl Update {
    /// Returns `true` if the field of `kind` is set.
    pub fn has(&self, kind: UpdateKind) -> bool {
        match kind {
            UpdateKind::Message => self.message.is_some(),
            UpdateKind::EditedMessage => self.edited_message.is_some(),
            UpdateKind::ChannelPost => self.channel_post.is_some(),
            UpdateKind::EditedChannelPost => self.edited_channel_post.is_some(),
            UpdateKind::BusinessConnection => self.business_connection.is_some(),
            UpdateKind::BusinessMessage => self.business_message.is_some(),
            UpdateKind::EditedBusinessMessage => self.edited_business_message.is_some(),
            UpdateKind::DeletedBusinessMessages => self.deleted_business_messages.is_some(),
            UpdateKind::MessageReaction => self.message_reaction.is_some(),
            UpdateKind::MessageReactionCount => self.message_reaction_count.is_some(),
            UpdateKind::InlineQuery => self.inline_query.is_some(),
            UpdateKind::ChosenInlineResult => self.chosen_inline_result.is_some(),
            UpdateKind::CallbackQuery => self.callback_query.is_some(),
            UpdateKind::ShippingQuery => self.shipping_query.is_some(),
            UpdateKind::PreCheckoutQuery => self.pre_checkout_query.is_some(),
            UpdateKind::PurchasedPaidMedia => self.purchased_paid_media.is_some(),
            UpdateKind::Poll => self.poll.is_some(),
            UpdateKind::PollAnswer => self.poll_answer.is_some(),
            UpdateKind::MyChatMember => self.my_chat_member.is_some(),
            UpdateKind::ChatMember => self.chat_member.is_some(),
            UpdateKind::ChatJoinRequest => self.chat_join_request.is_some(),
            UpdateKind::ChatBoost => self.chat_boost.is_some(),
            UpdateKind::RemovedChatBoost => self.removed_chat_boost.is_some(),
        }
    }

    /// Kind of the first populated field.
    pub fn kind(&self) -> Option<UpdateKind> {
        UpdateKind::ALL.iter().copied().find(|&kind| self.has(kind))
    }
}

/// Current webhook status, as returned by `getWebhookInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    /// Empty if the bot uses long polling.
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<UpdateKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_first_populated_field() {
        let update: Update = serde_json::from_str(
            r#"{"update_id":10,"poll_answer":{"poll_id":"p","option_ids":[1]}}"#,
        )
        .unwrap();
        assert_eq!(update.id, 10);
        assert_eq!(update.kind(), Some(UpdateKind::PollAnswer));
        assert!(Update::default().kind().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(UpdateKind::ALL.len(), 23);
        for kind in UpdateKind::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let update: Update =
            serde_json::from_str(r#"{"update_id":3,"some_future_kind":{"x":1}}"#).unwrap();
        assert_eq!(update.kind(), None);
    }
}
