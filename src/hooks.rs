//! Ready-made hooks for [`Control`](crate::Control).
//!
//! The `null_*` hooks do nothing and are the defaults. The other two
//! understand a small, closed set of payload types:
//!
//! | `Output::data` type         | content-type                | body            |
//! |-----------------------------|-----------------------------|-----------------|
//! | `String`, `&'static str`    | `text/plain; charset=utf-8` | UTF-8 bytes     |
//! | `serde_json::Value`         | `application/json`          | compact JSON    |
//! | `Bytes`, `Vec<u8>`          | `application/octet-stream`  | the bytes as-is |
//!
//! Any other payload gets no content-type and an empty body.

use bytes::Bytes;
use serde_json::Value;
use tracing::warn;

use crate::endpoint::{Input, Output};
use crate::response::ContentType;

pub fn null_initialize(_input: &mut Input<'_>) {}

pub fn null_finalize(_output: &mut Output) {}

pub fn null_bytes(_output: &Output) -> Bytes {
    Bytes::new()
}

/// Sets `content-type` from the payload type, unless the endpoint already
/// chose one.
pub fn content_type_finalize(output: &mut Output) {
    if output.header_value("content-type").is_some() {
        return;
    }
    if let Some(content_type) = content_type_of(output) {
        output.set_header("content-type", content_type.as_str());
    }
}

/// Serializes the payload types listed in the module docs.
pub fn payload_bytes(output: &Output) -> Bytes {
    if let Some(s) = output.data_ref::<String>() {
        return Bytes::copy_from_slice(s.as_bytes());
    }
    if let Some(&s) = output.data_ref::<&'static str>() {
        return Bytes::from_static(s.as_bytes());
    }
    if let Some(b) = output.data_ref::<Bytes>() {
        return b.clone();
    }
    if let Some(b) = output.data_ref::<Vec<u8>>() {
        return Bytes::copy_from_slice(b);
    }
    if let Some(json) = output.data_ref::<Value>() {
        return match serde_json::to_vec(json) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                warn!(error = %e, "payload did not serialize, sending empty body");
                Bytes::new()
            }
        };
    }
    Bytes::new()
}

fn content_type_of(output: &Output) -> Option<ContentType> {
    if output.data_ref::<String>().is_some() || output.data_ref::<&'static str>().is_some() {
        Some(ContentType::Text)
    } else if output.data_ref::<Value>().is_some() {
        Some(ContentType::Json)
    } else if output.data_ref::<Bytes>().is_some() || output.data_ref::<Vec<u8>>().is_some() {
        Some(ContentType::OctetStream)
    } else {
        None
    }
}
