//! Bot API type catalogue.
//!
//! A representative subset of the API's objects. Received objects derive
//! both `Serialize` and `Deserialize`; outgoing-only objects (input media,
//! inline results) only serialize. Discriminated unions are declared through
//! the [`variant`](crate::variant) codec.
//!
//! Fields without doc comments carry the meaning given by the Bot API
//! documentation for the field of the same name.

mod chat;
mod input;
mod markup;
mod media;
mod message;
mod payments;
mod poll;
mod query;
mod update;

pub use chat::*;
pub use input::*;
pub use markup::*;
pub use media::*;
pub use message::*;
pub use payments::*;
pub use poll::*;
pub use query::*;
pub use update::*;
