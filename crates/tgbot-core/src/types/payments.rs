//! Telegram Stars transactions and gifts.

use serde::{Deserialize, Serialize};

use crate::types::{Chat, PaidMedia, User};

// =============================================================================
// Withdrawals
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueWithdrawalStatePending {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueWithdrawalStateSucceeded {
    pub date: i64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueWithdrawalStateFailed {}

crate::variant_family! {
    /// State of a withdrawal, keyed by `type`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RevenueWithdrawalState: "type" {
        "pending" => Pending(RevenueWithdrawalStatePending),
        "succeeded" => Succeeded(RevenueWithdrawalStateSucceeded),
        "failed" => Failed(RevenueWithdrawalStateFailed),
    }
}

// =============================================================================
// Transaction partners
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPartnerUser {
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paid_media: Vec<PaidMedia>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPartnerChat {
    pub chat: Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPartnerFragment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub withdrawal_state: Option<RevenueWithdrawalState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPartnerTelegramAds {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPartnerTelegramApi {
    pub request_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPartnerOther {}

crate::variant_family! {
    /// Counterparty of a Stars transaction, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum TransactionPartner: "type" {
        "user" => User(TransactionPartnerUser),
        "chat" => Chat(TransactionPartnerChat),
        "fragment" => Fragment(TransactionPartnerFragment),
        "telegram_ads" => TelegramAds(TransactionPartnerTelegramAds),
        "telegram_api" => TelegramApi(TransactionPartnerTelegramApi),
        "other" => Other(TransactionPartnerOther),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarTransaction {
    pub id: String,
    pub amount: i64,
    pub date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<TransactionPartner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<TransactionPartner>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarTransactions {
    pub transactions: Vec<StarTransaction>,
}

// =============================================================================
// Gifts
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: String,
    pub star_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueGift {
    pub base_name: String,
    pub name: String,
    pub number: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedGiftRegular {
    pub gift: Gift,
    pub send_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_gift_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert_star_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedGiftUnique {
    pub gift: UniqueGift,
    pub send_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_gift_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_be_transferred: Option<bool>,
}

crate::variant_family! {
    /// A gift owned by a user or chat, keyed by `type`.
    #[derive(Debug, Clone, PartialEq)]
    pub enum OwnedGift: "type" {
        "regular" => Regular(OwnedGiftRegular),
        "unique" => Unique(OwnedGiftUnique),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedGifts {
    pub total_count: i64,
    pub gifts: Vec<OwnedGift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_with_nested_families() {
        let json = serde_json::json!({
            "id": "tx1",
            "amount": 50,
            "date": 1,
            "receiver": {
                "type": "fragment",
                "withdrawal_state": {"type": "succeeded", "date": 2, "url": "https://fragment.com/tx"}
            }
        });
        let tx: StarTransaction = serde_json::from_value(json.clone()).unwrap();
        let Some(TransactionPartner::Fragment(fragment)) = &tx.receiver else {
            panic!("expected fragment partner");
        };
        assert_eq!(
            fragment.withdrawal_state.as_ref().map(RevenueWithdrawalState::kind),
            Some("succeeded")
        );
        assert_eq!(serde_json::to_value(&tx).unwrap(), json);
    }

    #[test]
    fn test_every_registered_kind_round_trips() {
        for state in [
            RevenueWithdrawalState::Pending(RevenueWithdrawalStatePending {}),
            RevenueWithdrawalState::Failed(RevenueWithdrawalStateFailed {}),
        ] {
            let text = serde_json::to_string(&state).unwrap();
            let decoded: RevenueWithdrawalState = serde_json::from_str(&text).unwrap();
            assert_eq!(decoded.kind(), state.kind());
            assert!(RevenueWithdrawalState::KINDS.contains(&decoded.kind()));
        }
    }

    #[test]
    fn test_owned_gift_unknown_type() {
        let err = serde_json::from_str::<OwnedGift>(r#"{"type":"legendary","send_date":1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unknown OwnedGift variant `legendary`"));
    }
}
