// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fmt, sync::Arc};

use bytes::Bytes;
use parleycommon::{
    identifiers::SenderId,
    records::{MediaKind, RecordContent},
};
use url::Url;

pub mod hydrator;

/// Position of a message in the render store
///
/// Ids are assigned in arrival order when the message is appended, so ordering by id is the
/// display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId {
    created_order: u64,
}

impl MessageId {
    pub(crate) fn new(created_order: u64) -> Self {
        Self { created_order }
    }

    pub fn created_order(&self) -> u64 {
        self.created_order
    }

    pub(crate) fn index(&self) -> Option<usize> {
        self.created_order.try_into().ok()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.created_order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    sender_id: SenderId,
    sender_name: String,
    content: MessageContent,
}

impl Message {
    pub(crate) fn new(
        id: MessageId,
        sender_id: SenderId,
        sender_name: String,
        content: MessageContent,
    ) -> Self {
        Self {
            id,
            sender_id,
            sender_name,
            content,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut MessageContent {
        &mut self.content
    }

    pub fn kind(&self) -> MediaKind {
        self.content.kind()
    }

    /// Whether the message was sent by the user with the given id
    pub fn is_outgoing(&self, own_sender_id: &SenderId) -> bool {
        &self.sender_id == own_sender_id
    }
}

/// Content of a message in the render store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text { text: String },
    Photo { url: Url, media: MediaState },
    Video { url: Url, media: MediaState },
}

impl MessageContent {
    pub fn kind(&self) -> MediaKind {
        match self {
            MessageContent::Text { .. } => MediaKind::Text,
            MessageContent::Photo { .. } => MediaKind::Photo,
            MessageContent::Video { .. } => MediaKind::Video,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn media_url(&self) -> Option<&Url> {
        match self {
            MessageContent::Text { .. } => None,
            MessageContent::Photo { url, .. } | MessageContent::Video { url, .. } => Some(url),
        }
    }

    pub fn media(&self) -> Option<&MediaState> {
        match self {
            MessageContent::Text { .. } => None,
            MessageContent::Photo { media, .. } | MessageContent::Video { media, .. } => {
                Some(media)
            }
        }
    }

    pub(crate) fn media_mut(&mut self) -> Option<&mut MediaState> {
        match self {
            MessageContent::Text { .. } => None,
            MessageContent::Photo { media, .. } | MessageContent::Video { media, .. } => {
                Some(media)
            }
        }
    }

    /// Whether this is a media message whose bytes are not resolved yet
    pub fn is_placeholder(&self) -> bool {
        matches!(self.media(), Some(MediaState::Pending))
    }
}

impl From<RecordContent> for MessageContent {
    fn from(content: RecordContent) -> Self {
        match content {
            RecordContent::Text { text } => MessageContent::Text { text },
            RecordContent::Photo { file_url } => MessageContent::Photo {
                url: file_url,
                media: MediaState::Pending,
            },
            RecordContent::Video { file_url } => MessageContent::Video {
                url: file_url,
                media: MediaState::Pending,
            },
        }
    }
}

/// Hydration state of the media of a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MediaState {
    /// Bytes are not downloaded yet, or the download failed
    #[default]
    Pending,
    Ready(Arc<MediaPayload>),
}

impl MediaState {
    pub fn payload(&self) -> Option<&MediaPayload> {
        match self {
            MediaState::Pending => None,
            MediaState::Ready(payload) => Some(payload),
        }
    }
}

/// Downloaded media of a message
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    bytes: Bytes,
    content_type: String,
    dimensions: Option<(u32, u32)>,
}

impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl MediaPayload {
    pub fn new(bytes: Bytes, content_type: impl Into<String>, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            dimensions,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Width and height in pixels; only known for photos
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}
