//! Echo Bot Example
//!
//! Repeats every text message back to its chat, plus two commands:
//!
//! - `/confirm` sends a Yes/No keyboard; the first press edits the message,
//!   and after a minute without one the buttons are taken away.
//! - `/poll` sends a non-anonymous poll and reports each vote.
//!
//! # Usage
//!
//! ```bash
//! TGBOT_TOKEN=123456:ABC cargo run --package echo-bot
//! ```
//!
//! Settings are read from `tgbot.toml` in the working directory when present.

use std::sync::Arc;
use std::time::Duration;

use tgbot::core::BoxError;
use tgbot::core::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputPollOption};
use tgbot::prelude::*;
use tracing::info;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Default)]
struct Routers {
    callbacks: Arc<CallbackRouter>,
    polls: Arc<PollRouter>,
}

// ============================================================================
// Messages
// ============================================================================

async fn on_message(ctx: Context, routers: Routers, msg: Message) -> Result<Option<Call>> {
    let Some(text) = msg.text.clone() else {
        return Ok(None);
    };

    match text.split_whitespace().next() {
        Some("/confirm") => {
            confirm(&ctx, &routers.callbacks, msg.chat.id).await?;
            Ok(None)
        }
        Some("/poll") => {
            poll(&ctx, &routers.polls, msg.chat.id).await?;
            Ok(None)
        }
        _ => Ok(Some(Call::new(SendMessage::new(msg.chat.id, text)))),
    }
}

async fn confirm(ctx: &Context, callbacks: &CallbackRouter, chat_id: i64) -> Result<()> {
    let keyboard = InlineKeyboardMarkup::new([vec![
        InlineKeyboardButton::callback("Yes", "yes"),
        InlineKeyboardButton::callback("No", "no"),
    ]]);
    let sent = ctx
        .execute(SendMessage::new(chat_id, "Are you sure?").reply_markup(keyboard))
        .await?;

    let route = Route::new(|ctx: CallbackContext, query: CallbackQuery| async move {
        let choice = query.data.as_deref().unwrap_or_default();
        let Some(message) = &query.message else {
            return CallbackReply::new(CallbackAnswer::default());
        };
        let text = format!("{} answered {choice}", query.from.first_name);
        let edit = EditMessageText::new(message.chat.id, message.id, text);
        match ctx.execute(edit).await {
            Ok(_) => CallbackReply::new(CallbackAnswer::text("Noted")),
            Err(err) => CallbackReply::new(CallbackAnswer::alert(err.to_string())),
        }
    })
    .name("confirm")
    .once()
    .timeout(CONFIRM_TIMEOUT)
    .on_expire(|ctx: CallbackContext, key: MessageKey| async move {
        if let MessageKey::Chat { chat_id, message_id } = key {
            ctx.execute(EditMessageText::new(chat_id, message_id, "Too late."))
                .await?;
        }
        Ok::<_, BoxError>(())
    });

    callbacks.insert(MessageKey::of(&sent), route);
    Ok(())
}

async fn poll(ctx: &Context, polls: &PollRouter, chat_id: i64) -> Result<()> {
    let mut request = SendPoll::new(
        chat_id,
        "Tabs or spaces?",
        ["Tabs", "Spaces"].map(InputPollOption::from),
    );
    request.is_anonymous = false;
    let sent = ctx.execute(request).await?;

    let Some(poll) = sent.poll else {
        return Ok(());
    };
    polls.register(poll.id, move |ctx: Context, answer: PollAnswer| async move {
        let voter = answer
            .user
            .map(|user| user.first_name)
            .unwrap_or_else(|| "someone".to_string());
        let text = match answer.option_ids.first() {
            Some(0) => format!("{voter} voted for tabs"),
            Some(_) => format!("{voter} voted for spaces"),
            None => format!("{voter} took their vote back"),
        };
        if let Err(err) = ctx.execute(SendMessage::new(chat_id, text)).await {
            tracing::warn!(error = %err, "failed to report vote");
        }
    });
    Ok(())
}

// ============================================================================
// Queries
// ============================================================================

async fn on_callback_query(ctx: CallbackContext, routers: Routers, query: CallbackQuery) -> Result<()> {
    if !routers.callbacks.handle(&ctx, query).await {
        ctx.answer(CallbackAnswer::text("This button has expired")).await?;
    }
    Ok(())
}

async fn on_poll_answer(ctx: Context, routers: Routers, answer: PollAnswer) {
    routers.polls.handle(&ctx, answer).await;
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut runtime = BotRuntime::new()?;
    let routers = Routers::default();

    let r = routers.clone();
    runtime
        .handlers()
        .on_message(move |ctx: Context, msg: Message| on_message(ctx, r.clone(), msg));
    let r = routers.clone();
    runtime
        .handlers()
        .on_callback_query(move |ctx: CallbackContext, query: CallbackQuery| {
            on_callback_query(ctx, r.clone(), query)
        });
    let r = routers;
    runtime
        .handlers()
        .on_poll_answer(move |ctx: Context, answer: PollAnswer| on_poll_answer(ctx, r.clone(), answer));

    info!("echo bot starting");
    runtime.run().await?;
    Ok(())
}
