// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Classification of raw feed records
//!
//! The feed is not schema-enforced, so every record is validated before it becomes a message.

use parleycommon::{
    identifiers::{SenderId, SenderIdError},
    records::{FeedRecord, MediaKind, RecordContent, UnknownMediaKind},
};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

pub use watcher::FeedWatcher;

mod watcher;

const FIELD_SENDER_ID: &str = "senderId";
const FIELD_SENDER_NAME: &str = "senderName";
const FIELD_MEDIA_TYPE: &str = "mediaType";
const FIELD_TEXT: &str = "text";
const FIELD_FILE_URL: &str = "fileURL";

/// Reason why a raw feed record was dropped
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` is not a string")]
    WrongType(&'static str),
    #[error("invalid sender id: {0}")]
    InvalidSenderId(#[from] SenderIdError),
    #[error("invalid file url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unknown media type `{0}`")]
    UnknownMediaType(String),
}

impl From<UnknownMediaKind> for RecordError {
    fn from(UnknownMediaKind(media_type): UnknownMediaKind) -> Self {
        Self::UnknownMediaType(media_type)
    }
}

/// Validates a raw feed record and extracts its typed content.
pub fn classify(raw: &Value) -> Result<FeedRecord, RecordError> {
    let record = raw.as_object().ok_or(RecordError::NotAnObject)?;

    let sender_id = string_field(record, FIELD_SENDER_ID)?.parse::<SenderId>()?;
    let sender_name = string_field(record, FIELD_SENDER_NAME)?.to_owned();
    let content = match string_field(record, FIELD_MEDIA_TYPE)?.parse::<MediaKind>()? {
        MediaKind::Text => RecordContent::Text {
            text: string_field(record, FIELD_TEXT)?.to_owned(),
        },
        MediaKind::Photo => RecordContent::Photo {
            file_url: Url::parse(string_field(record, FIELD_FILE_URL)?)?,
        },
        MediaKind::Video => RecordContent::Video {
            file_url: Url::parse(string_field(record, FIELD_FILE_URL)?)?,
        },
    };

    Ok(FeedRecord {
        sender_id,
        sender_name,
        content,
    })
}

/// The sender of a raw record, even if the rest of the record is invalid
pub(crate) fn sender_id_of(raw: &Value) -> Option<SenderId> {
    raw.get(FIELD_SENDER_ID)?.as_str()?.parse().ok()
}

fn string_field<'a>(
    record: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, RecordError> {
    match record.get(name) {
        None | Some(Value::Null) => Err(RecordError::MissingField(name)),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(RecordError::WrongType(name)),
    }
}
