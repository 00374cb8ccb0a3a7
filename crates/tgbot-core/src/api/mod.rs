//! Typed methods.
//!
//! Every request record derives `Params` and implements [`Method`], which
//! ties it to its method name and response type:
//!
//! ```rust,ignore
//! let me = ctx.execute(GetMe).await?;
//! let sent = ctx.execute(SendMessage::new(chat_id, "hello")).await?;
//! ```
//!
//! Methods missing here stay reachable by name through
//! [`Context::request`](crate::Context::request).

use serde::de::DeserializeOwned;

use crate::payload::IntoParams;

mod answers;
mod bot;
mod messages;
mod updates;

pub use answers::*;
pub use bot::*;
pub use messages::*;
pub use updates::*;

/// A request record bound to a Bot API method.
pub trait Method: IntoParams + Send {
    /// Method name, as used in the URL.
    const NAME: &'static str;
    /// Decoded `result` type.
    type Response: DeserializeOwned + Send;
}

macro_rules! impl_method {
    ($($ty:ty => $name:literal: $response:ty),* $(,)?) => {
        $(
            impl $crate::api::Method for $ty {
                const NAME: &'static str = $name;
                type Response = $response;
            }
        )*
    };
}

pub(crate) use impl_method;
