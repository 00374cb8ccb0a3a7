//! Codec for discriminated unions.
//!
//! # Overview
//!
//! The Bot API models sums as flat objects: one discriminator field (`type`,
//! `status` or `source`) next to the fields of the selected alternative.
//!
//! ```text
//! {"status": "kicked", "user": {...}, "until_date": 0}
//!  └─ discriminator    └─ ChatMemberBanned fields
//! ```
//!
//! Encoding serializes the discriminator and the alternative separately and
//! splices the two objects together, see [`splice_objects`]. Decoding peeks
//! the discriminator and decodes the whole object into the registered
//! record; an unregistered value is an [`UnknownVariant`] error.
//!
//! Families are declared with [`variant_family!`](crate::variant_family)
//! (encode and decode) or [`encode_variants!`](crate::encode_variants) (input
//! types that are only ever sent). The generated `match` is the registry: it
//! is fixed at build time and cannot change afterwards.

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::value::RawValue;
use thiserror::Error;

/// Decoded discriminator value with no registered alternative.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {family} variant `{id}`")]
pub struct UnknownVariant {
    /// Family name.
    pub family: &'static str,
    /// Offending discriminator value.
    pub id: String,
}

impl UnknownVariant {
    #[doc(hidden)]
    pub fn new(family: &'static str, id: String) -> Self {
        Self { family, id }
    }
}

/// Joins two serialized JSON objects into one.
///
/// The closing brace of `head` and the opening brace of `body` are dropped
/// and the rest joined with a comma. An empty `body` (`{}`) leaves `head`
/// unchanged.
///
/// ```rust
/// use tgbot_core::variant::splice_objects;
///
/// assert_eq!(
///     splice_objects(r#"{"type":"photo"}"#, r#"{"media":"x"}"#),
///     r#"{"type":"photo","media":"x"}"#
/// );
/// ```
pub fn splice_objects(head: &str, body: &str) -> String {
    let head = head.trim();
    let body = body.trim();
    if is_empty_object(body) {
        return head.to_string();
    }
    if is_empty_object(head) {
        return body.to_string();
    }

    let head = head.strip_suffix('}').unwrap_or(head);
    let body = body.strip_prefix('{').unwrap_or(body);
    let mut out = String::with_capacity(head.len() + body.len() + 1);
    out.push_str(head);
    out.push(',');
    out.push_str(body);
    out
}

fn is_empty_object(text: &str) -> bool {
    text.strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .is_some_and(|inner| inner.trim().is_empty())
}

/// A record serialized with a leading discriminator field.
pub struct Tagged<'a, B: ?Sized> {
    field: &'static str,
    tag: &'static str,
    body: &'a B,
}

impl<'a, B: ?Sized> Tagged<'a, B> {
    /// Wraps `body` with `field: tag`.
    pub fn new(field: &'static str, tag: &'static str, body: &'a B) -> Self {
        Self { field, tag, body }
    }
}

impl<B: Serialize + ?Sized> Serialize for Tagged<'_, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut head = serde_json::Map::new();
        head.insert(self.field.to_string(), Value::from(self.tag));
        let head = serde_json::to_string(&head).map_err(S::Error::custom)?;

        let body = serde_json::to_string(self.body).map_err(S::Error::custom)?;
        let merged = match body.as_str() {
            "null" => head,
            text if text.starts_with('{') => splice_objects(&head, text),
            _ => {
                return Err(S::Error::custom(format!(
                    "variant `{}` must serialize to an object",
                    self.tag
                )));
            }
        };

        RawValue::from_string(merged)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// Reads the discriminator of a decoded object.
#[doc(hidden)]
pub fn discriminator(value: &Value, field: &str) -> Result<String, String> {
    match value.get(field) {
        Some(Value::String(tag)) => Ok(tag.clone()),
        Some(_) => Err(format!("discriminator `{field}` must be a string")),
        None => Err(format!("missing discriminator `{field}`")),
    }
}

/// Declares an encode-and-decode union keyed by a discriminator field.
///
/// ```rust,ignore
/// variant_family! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum ReactionType: "type" {
///         "emoji" => Emoji(ReactionTypeEmoji),
///         "custom_emoji" => CustomEmoji(ReactionTypeCustomEmoji),
///     }
/// }
/// ```
#[macro_export]
macro_rules! variant_family {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $field:literal {
            $( $(#[$vmeta:meta])* $tag:literal => $variant:ident($body:ty) ),* $(,)?
        }
    ) => {
        $crate::encode_variants! {
            $(#[$meta])*
            $vis enum $name : $field {
                $( $(#[$vmeta])* $tag => $variant($body), )*
            }
        }

        impl $name {
            /// Registered discriminator values.
            pub const KINDS: &'static [&'static str] = &[$($tag),*];
        }

        impl<'de> $crate::__serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: $crate::__serde::Deserializer<'de>,
            {
                use $crate::__serde::de::Error as _;

                let value = <$crate::__serde_json::Value as $crate::__serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                let tag = $crate::variant::discriminator(&value, $field).map_err(D::Error::custom)?;
                match tag.as_str() {
                    $(
                        $tag => $crate::__serde_json::from_value(value)
                            .map(Self::$variant)
                            .map_err(D::Error::custom),
                    )*
                    _ => Err(D::Error::custom($crate::variant::UnknownVariant::new(
                        stringify!($name),
                        tag,
                    ))),
                }
            }
        }
    };
}

/// Declares an encode-only union keyed by a discriminator field.
#[macro_export]
macro_rules! encode_variants {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $field:literal {
            $( $(#[$vmeta:meta])* $tag:literal => $variant:ident($body:ty) ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant($body), )*
        }

        impl $name {
            /// Name of the discriminator field.
            pub const FIELD: &'static str = $field;

            /// Discriminator value of this alternative.
            pub fn kind(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $tag, )*
                }
            }
        }

        $(
            impl ::core::convert::From<$body> for $name {
                fn from(body: $body) -> Self {
                    Self::$variant(body)
                }
            }
        )*

        impl $crate::__serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__serde::Serializer,
            {
                match self {
                    $(
                        Self::$variant(body) => $crate::__serde::Serialize::serialize(
                            &$crate::variant::Tagged::new($field, $tag, body),
                            serializer,
                        ),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Circle {
        radius: u32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Empty {}

    crate::variant_family! {
        #[derive(Debug, Clone, PartialEq)]
        enum Shape: "kind" {
            "circle" => Circle(Circle),
            "nothing" => Nothing(Empty),
        }
    }

    #[test]
    fn test_splice_objects() {
        assert_eq!(splice_objects(r#"{"a":1}"#, r#"{"b":2}"#), r#"{"a":1,"b":2}"#);
        assert_eq!(splice_objects(r#"{"a":1}"#, "{}"), r#"{"a":1}"#);
        assert_eq!(splice_objects("{}", r#"{"b":2}"#), r#"{"b":2}"#);
    }

    #[test]
    fn test_encode_puts_discriminator_first() {
        let shape = Shape::Circle(Circle { radius: 3 });
        assert_eq!(serde_json::to_string(&shape).unwrap(), r#"{"kind":"circle","radius":3}"#);
        assert_eq!(
            serde_json::to_string(&Shape::Nothing(Empty {})).unwrap(),
            r#"{"kind":"nothing"}"#
        );
        assert_eq!(serde_json::to_value(&shape).unwrap()["radius"], 3);
    }

    #[test]
    fn test_decode_round_trip() {
        for shape in [Shape::Circle(Circle { radius: 9 }), Shape::Nothing(Empty {})] {
            let text = serde_json::to_string(&shape).unwrap();
            let decoded: Shape = serde_json::from_str(&text).unwrap();
            assert_eq!(decoded.kind(), shape.kind());
            assert_eq!(decoded, shape);
        }
        assert_eq!(Shape::KINDS, &["circle", "nothing"]);
        assert_eq!(Shape::FIELD, "kind");
    }

    #[test]
    fn test_unknown_discriminator_names_the_id() {
        let err = serde_json::from_str::<Shape>(r#"{"kind":"hexagon"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown Shape variant `hexagon`"));

        let err = serde_json::from_str::<Shape>(r#"{"radius":1}"#).unwrap_err();
        assert!(err.to_string().contains("missing discriminator `kind`"));
    }
}
