//! Answers to queries.
//!
//! Each answer is split in two: the answer body (what the handler decides)
//! and the method record (body plus the query id). The framework's query
//! handle fills in the id, so handlers only build the body.

use tgbot_macros::Params;

use crate::api::impl_method;
use crate::types::{InlineQueryResult, SentWebAppMessage, ShippingOption};

#[derive(Debug, Clone, Default, Params)]
pub struct CallbackAnswer {
    pub text: Option<String>,
    pub show_alert: bool,
    pub url: Option<String>,
    pub cache_time: u32,
}

impl CallbackAnswer {
    /// A notification shown at the top of the chat.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// A modal alert instead of a notification.
    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            show_alert: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[tg(flatten)]
    pub answer: CallbackAnswer,
}

#[derive(Debug, Clone, Default, Params)]
pub struct InlineAnswer {
    #[tg(force)]
    pub results: Vec<InlineQueryResult>,
    pub cache_time: u32,
    pub is_personal: bool,
    pub next_offset: Option<String>,
}

impl InlineAnswer {
    pub fn new(results: impl IntoIterator<Item = InlineQueryResult>) -> Self {
        Self {
            results: results.into_iter().collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    #[tg(flatten)]
    pub answer: InlineAnswer,
}

/// Shipping answer; `ok = false` requires an `error_message`.
#[derive(Debug, Clone, Default, Params)]
pub struct ShippingAnswer {
    #[tg(force)]
    pub ok: bool,
    pub shipping_options: Vec<ShippingOption>,
    pub error_message: Option<String>,
}

impl ShippingAnswer {
    pub fn options(options: impl IntoIterator<Item = ShippingOption>) -> Self {
        Self {
            ok: true,
            shipping_options: options.into_iter().collect(),
            error_message: None,
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            shipping_options: Vec::new(),
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct AnswerShippingQuery {
    pub shipping_query_id: String,
    #[tg(flatten)]
    pub answer: ShippingAnswer,
}

#[derive(Debug, Clone, Default, Params)]
pub struct PreCheckoutAnswer {
    #[tg(force)]
    pub ok: bool,
    pub error_message: Option<String>,
}

impl PreCheckoutAnswer {
    pub fn accept() -> Self {
        Self {
            ok: true,
            error_message: None,
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Params)]
pub struct AnswerPreCheckoutQuery {
    pub pre_checkout_query_id: String,
    #[tg(flatten)]
    pub answer: PreCheckoutAnswer,
}

#[derive(Debug, Clone, Params)]
pub struct WebAppAnswer {
    pub result: InlineQueryResult,
}

#[derive(Debug, Clone, Params)]
pub struct AnswerWebAppQuery {
    pub web_app_query_id: String,
    #[tg(flatten)]
    pub answer: WebAppAnswer,
}

impl_method! {
    AnswerCallbackQuery => "answerCallbackQuery": bool,
    AnswerInlineQuery => "answerInlineQuery": bool,
    AnswerShippingQuery => "answerShippingQuery": bool,
    AnswerPreCheckoutQuery => "answerPreCheckoutQuery": bool,
    AnswerWebAppQuery => "answerWebAppQuery": SentWebAppMessage,
}
