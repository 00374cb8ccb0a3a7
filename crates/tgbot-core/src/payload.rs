//! Request payload builder.
//!
//! # Overview
//!
//! A [`Payload`] collects the parameters of one method call. Textual
//! parameters go to `params`; file parameters go to `files`, keyed by the
//! multipart field name. Setters drop zero values unless forced, which keeps
//! optional parameters off the wire without wrapping every field in `Option`.
//!
//! | Setter | Stores |
//! |--------|--------|
//! | [`set`](Payload::set) / [`force`](Payload::force) | text, or any [`ParamValue`] |
//! | [`set_int`](Payload::set_int), [`set_uint`](Payload::set_uint), [`set_float`](Payload::set_float), [`set_bool`](Payload::set_bool) | decimal text |
//! | [`set_json`](Payload::set_json) | `serde_json` text |
//! | [`set_file`](Payload::set_file) | an [`InputFile`] |
//! | [`attach`](Payload::attach) | a local stream under a synthetic `attach-<n>` label |
//! | [`set_input`](Payload::set_input) | JSON after attaching nested uploads |
//! | [`add_object`](Payload::add_object) | every field of an [`IntoParams`] record |
//!
//! The body is produced once by [`into_body`](Payload::into_body): a
//! form-urlencoded buffer when no local stream is present, otherwise a
//! streamed `multipart/form-data` body.

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::{Error, Result, Snapshot};
use crate::file::InputFile;
use crate::multipart;

/// Content type of bodies without local streams.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

// =============================================================================
// Capability traits
// =============================================================================

/// A value that can be written under a single parameter name.
///
/// Implemented for text, every primitive number, `bool`, [`InputFile`] and a
/// few enumerations of the type catalogue. Zero values (`""`, `0`, `0.0`,
/// `false`) are dropped unless `force` is set.
pub trait ParamValue {
    /// Writes `self` under `key`.
    fn write_param(self, key: &str, force: bool, payload: &mut Payload);
}

/// A record that writes its fields into a payload.
///
/// Usually implemented with `#[derive(Params)]`.
pub trait IntoParams {
    /// Writes every field of `self`.
    fn write_params(self, payload: &mut Payload);
}

/// A structured value that may embed local uploads.
///
/// [`Payload::set_input`] calls [`attach_files`](InputObject::attach_files)
/// before serializing, so every nested [`InputFile::Upload`] is registered as
/// a multipart part and replaced by its `attach://` reference.
pub trait InputObject {
    /// Moves nested uploads into `payload`.
    fn attach_files(&mut self, payload: &mut Payload);
}

impl ParamValue for String {
    fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
        payload.put_text(key, self, force);
    }
}

impl ParamValue for &str {
    fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
        payload.put_text(key, self.to_string(), force);
    }
}

impl ParamValue for &String {
    fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
        payload.put_text(key, self.clone(), force);
    }
}

impl ParamValue for bool {
    fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
        if self || force {
            payload.put_text(key, self.to_string(), true);
        }
    }
}

macro_rules! impl_int_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for $ty {
                fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
                    if self != 0 || force {
                        payload.put_text(key, self.to_string(), true);
                    }
                }
            }
        )*
    };
}

impl_int_param!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_float_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for $ty {
                fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
                    if self != 0.0 || force {
                        payload.put_text(key, format!("{self:.6}"), true);
                    }
                }
            }
        )*
    };
}

impl_float_param!(f32, f64);

impl<T: ParamValue> ParamValue for Option<T> {
    fn write_param(self, key: &str, force: bool, payload: &mut Payload) {
        if let Some(value) = self {
            value.write_param(key, force, payload);
        }
    }
}

impl ParamValue for InputFile {
    fn write_param(self, key: &str, _force: bool, payload: &mut Payload) {
        payload.set_file(key, self);
    }
}

impl InputObject for InputFile {
    fn attach_files(&mut self, payload: &mut Payload) {
        if self.is_upload() {
            let upload = std::mem::replace(self, InputFile::Attach(String::new()));
            *self = payload.attach(upload);
        }
    }
}

impl<T: InputObject> InputObject for Option<T> {
    fn attach_files(&mut self, payload: &mut Payload) {
        if let Some(value) = self {
            value.attach_files(payload);
        }
    }
}

impl<T: InputObject> InputObject for Vec<T> {
    fn attach_files(&mut self, payload: &mut Payload) {
        for value in self {
            value.attach_files(payload);
        }
    }
}

impl<T: InputObject> InputObject for Box<T> {
    fn attach_files(&mut self, payload: &mut Payload) {
        (**self).attach_files(payload);
    }
}

impl IntoParams for BTreeMap<String, String> {
    fn write_params(self, payload: &mut Payload) {
        for (key, value) in self {
            payload.put_text(&key, value, false);
        }
    }
}

// =============================================================================
// Body
// =============================================================================

/// An encoded request body.
pub enum Body {
    /// A fully buffered body.
    Full(Bytes),
    /// A streamed body; read errors of upload sources arrive as `Err` items.
    Stream(BoxStream<'static, io::Result<Bytes>>),
}

impl Body {
    /// Collects the body into memory.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// A body together with its `Content-Type`.
#[derive(Debug)]
pub struct RequestBody {
    /// `Content-Type` header value.
    pub content_type: String,
    /// Body content.
    pub body: Body,
}

// =============================================================================
// Payload
// =============================================================================

/// Parameters of a single method call.
///
/// Not shared between calls: a payload is built, handed to the transport and
/// consumed by [`into_body`](Payload::into_body).
#[derive(Debug, Default)]
pub struct Payload {
    params: BTreeMap<String, String>,
    files: BTreeMap<String, InputFile>,
    next_attach: usize,
    error: Option<(String, serde_json::Error)>,
}

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_value`](Payload::set_value).
    pub fn with(mut self, key: &str, value: impl ParamValue) -> Self {
        value.write_param(key, false, &mut self);
        self
    }

    /// Stores text under `key`, dropping empty text.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.put_text(key, value.into(), false);
        self
    }

    /// Stores any [`ParamValue`], dropping zero values.
    pub fn set_value(&mut self, key: &str, value: impl ParamValue) -> &mut Self {
        value.write_param(key, false, self);
        self
    }

    /// Stores any [`ParamValue`], keeping zero values.
    pub fn force(&mut self, key: &str, value: impl ParamValue) -> &mut Self {
        value.write_param(key, true, self);
        self
    }

    /// Stores a signed integer; `0` is dropped.
    pub fn set_int(&mut self, key: &str, value: i64) -> &mut Self {
        self.set_value(key, value)
    }

    /// Stores an unsigned integer; `0` is dropped.
    pub fn set_uint(&mut self, key: &str, value: u64) -> &mut Self {
        self.set_value(key, value)
    }

    /// Stores a float with six fractional digits; `0.0` is dropped.
    pub fn set_float(&mut self, key: &str, value: f64) -> &mut Self {
        self.set_value(key, value)
    }

    /// Stores `true`; `false` is dropped.
    pub fn set_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.set_value(key, value)
    }

    /// Stores `value` serialized as JSON.
    ///
    /// `null` is skipped. An encoding failure is kept and reported when the
    /// body is produced.
    pub fn set_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> &mut Self {
        if let Some(text) = self.encode_json(key, value)
            && text != "null"
        {
            self.params.insert(key.to_string(), text);
        }
        self
    }

    /// Like [`set_json`](Payload::set_json), but also drops empty JSON
    /// (`[]`, `{}`, `""`) unless `force` is set.
    pub fn set_json_field<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        force: bool,
    ) -> &mut Self {
        if let Some(text) = self.encode_json(key, value) {
            let empty = matches!(text.as_str(), "[]" | "{}" | "\"\"");
            if text != "null" && (force || !empty) {
                self.params.insert(key.to_string(), text);
            }
        }
        self
    }

    /// Stores a file parameter.
    ///
    /// A local stream becomes a multipart part named `key`; the reference
    /// forms are sent as text.
    pub fn set_file(&mut self, key: &str, file: InputFile) -> &mut Self {
        if let Some(text) = file.as_text()
            && text.is_empty()
        {
            return self;
        }
        self.params.remove(key);
        self.files.insert(key.to_string(), file);
        self
    }

    /// Registers a local stream under the next `attach-<n>` label and returns
    /// the reference to embed in structured fields.
    ///
    /// Reference forms are returned unchanged.
    pub fn attach(&mut self, file: InputFile) -> InputFile {
        if !file.is_upload() {
            return file;
        }
        let label = format!("attach-{}", self.next_attach);
        self.next_attach += 1;
        self.files.insert(label.clone(), file);
        InputFile::Attach(label)
    }

    /// Attaches every nested upload of `value`, then stores it as JSON.
    pub fn set_input<T: InputObject + Serialize>(&mut self, key: &str, mut value: T) -> &mut Self {
        value.attach_files(self);
        self.set_json(key, &value)
    }

    /// Writes every field of a record.
    pub fn add_object(&mut self, object: impl IntoParams) -> &mut Self {
        object.write_params(self);
        self
    }

    /// Merges inherited parameters without overwriting existing keys.
    pub fn merge_base(&mut self, base: &BTreeMap<String, String>) {
        for (key, value) in base {
            if !self.contains(key) {
                self.params.insert(key.clone(), value.clone());
            }
        }
    }

    /// Stores text, keeping empty text only when `force` is set.
    pub fn put_text(&mut self, key: &str, value: String, force: bool) {
        if value.is_empty() && !force {
            return;
        }
        self.files.remove(key);
        self.params.insert(key.to_string(), value);
    }

    /// Removes a parameter or file.
    pub fn remove(&mut self, key: &str) {
        self.params.remove(key);
        self.files.remove(key);
    }

    /// Returns the text of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns a file parameter.
    pub fn file(&self, key: &str) -> Option<&InputFile> {
        self.files.get(key)
    }

    /// Returns `true` if `key` is set as a parameter or a file.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key) || self.files.contains_key(key)
    }

    /// Textual parameters.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Returns `true` if at least one local stream is attached.
    pub fn has_uploads(&self) -> bool {
        self.files.values().any(InputFile::is_upload)
    }

    /// Returns `true` if nothing has been set.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.files.is_empty()
    }

    /// Diagnostic view of the payload for `method`.
    pub fn snapshot(&self, method: &str) -> Snapshot {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(&self.params);
        let mut files = Vec::new();
        for (key, file) in &self.files {
            match file.as_text() {
                Some(text) => {
                    serializer.append_pair(key, &text);
                }
                None => files.push(format!("{key}: {}", file.describe())),
            }
        }
        Snapshot {
            method: method.to_string(),
            params: serializer.finish(),
            files,
        }
    }

    /// Consumes the payload and encodes its body.
    ///
    /// Multipart bodies are produced by a spawned task, so this must run
    /// inside a tokio runtime.
    pub fn into_body(self) -> Result<RequestBody> {
        if let Some((key, source)) = self.error {
            return Err(Error::Encode { key, source });
        }

        let Self {
            mut params, files, ..
        } = self;

        if !files.values().any(InputFile::is_upload) {
            for (key, file) in files {
                if let Some(text) = file.as_text() {
                    params.insert(key, text);
                }
            }
            let body = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&params)
                .finish();
            return Ok(RequestBody {
                content_type: FORM_URLENCODED.to_string(),
                body: Body::Full(Bytes::from(body)),
            });
        }

        Ok(multipart::encode(params, files))
    }

    fn encode_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Option<String> {
        match serde_json::to_string(value) {
            Ok(text) => Some(text),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some((key.to_string(), err));
                }
                None
            }
        }
    }
}
