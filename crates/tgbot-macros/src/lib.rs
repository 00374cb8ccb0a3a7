//! Procedural macros for the tgbot Telegram Bot API client.
//!
//! This crate provides:
//!
//! - `#[derive(Params)]` - Generates an `IntoParams` implementation that writes
//!   every field of a record into a request `Payload`
//!
//! # Params Derive Macro
//!
//! Request records are plain structs. The derive walks their fields at build
//! time and emits one typed setter call per field, so no runtime reflection is
//! involved:
//!
//! ```rust,ignore
//! use tgbot_core::{ChatId, InputFile, Params};
//!
//! #[derive(Params)]
//! pub struct SendPhoto {
//!     pub chat_id: ChatId,
//!     pub photo: InputFile,
//!     pub caption: Option<String>,
//!     #[tg(force)]
//!     pub disable_notification: bool,
//!     #[tg(rename = "reply_markup")]
//!     pub markup: Option<ReplyMarkup>,
//! }
//! ```

mod params;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `IntoParams` for a struct with named fields.
///
/// # Field routing
///
/// The parameter name defaults to the snake-case form of the field name. The
/// setter is picked from the field type:
///
/// | Type | Setter |
/// |------|--------|
/// | `String`, `&str`, integers, floats, `bool`, `ChatId`, `ParseMode` | `ParamValue` (zero values dropped) |
/// | `InputFile` | `Payload::set_file` |
/// | anything else | `Payload::set_json` |
///
/// `Option<T>` routes like `T`; `None` never reaches the payload.
///
/// # Attributes
///
/// - `#[tg(crate = "path")]` (container) - Path to `tgbot_core` (default `::tgbot_core`)
/// - `#[tg(namespace = "serde")]` (container) - Also read `rename` and `skip` from
///   another attribute namespace; the record must derive whatever declares it
/// - `#[tg(rename = "...")]` - Override the parameter name; `"-"` or `"_"` skips the field
/// - `#[tg(skip)]` - Never write the field
/// - `#[tg(force)]` - Keep zero values (`0`, `false`, `""`, `[]`)
/// - `#[tg(value)]` / `#[tg(json)]` - Force the scalar or JSON route
/// - `#[tg(input)]` - Serialize as JSON after attaching nested uploads (`InputObject`)
/// - `#[tg(flatten)]` - Embed another `IntoParams` record
#[proc_macro_derive(Params, attributes(tg))]
pub fn derive_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match params::derive_params(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
