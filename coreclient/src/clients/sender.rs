// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use chrono::Utc;
use infer::MatcherType;
use parleycommon::{
    identifiers::SenderId,
    records::{FeedRecord, MediaKind, RecordContent, UserRecord},
    settings::MediaSettings,
};
use thiserror::Error;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::{backend::Backend, utils::image::reencode_jpeg};

pub const ANONYMOUS_DISPLAY_NAME: &str = "anonymous";

const PHOTO_CONTENT_TYPE: &str = "image/jpeg";
const FALLBACK_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Who outgoing messages are sent as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    sender_id: SenderId,
    display_name: String,
    profile_url: Option<Url>,
}

impl Identity {
    pub fn new(sender_id: SenderId, display_name: impl Into<String>) -> Self {
        Self {
            sender_id,
            display_name: display_name.into(),
            profile_url: None,
        }
    }

    /// Identity of a user without a profile
    pub fn anonymous(sender_id: SenderId) -> Self {
        Self::new(sender_id, ANONYMOUS_DISPLAY_NAME)
    }

    pub fn sender_id(&self) -> &SenderId {
        &self.sender_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn with_profile_url(mut self, profile_url: Url) -> Self {
        self.profile_url = Some(profile_url);
        self
    }

    pub fn profile_url(&self) -> Option<&Url> {
        self.profile_url.as_ref()
    }

    /// The record under which other clients look up this user
    pub fn user_record(&self) -> UserRecord {
        UserRecord {
            display_name: self.display_name.clone(),
            id: self.sender_id.to_string(),
            profile_url: self
                .profile_url
                .as_ref()
                .map(Url::to_string)
                .unwrap_or_default(),
        }
    }
}

/// Media picked by the user
#[derive(Debug, Clone)]
pub enum LocalMedia {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl LocalMedia {
    async fn load(self) -> Result<Vec<u8>, SendError> {
        match self {
            LocalMedia::File(path) => tokio::fs::read(&path)
                .await
                .map_err(|source| SendError::ReadMedia { path, source }),
            LocalMedia::Bytes(bytes) => Ok(bytes),
        }
    }
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Message text is empty")]
    EmptyText,
    #[error("{0} messages have no media")]
    NotMediaKind(MediaKind),
    #[error("Failed to read {}: {source}", .path.display())]
    ReadMedia {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to process media: {0:#}")]
    Processing(anyhow::Error),
    #[error("Failed to upload media: {0:#}")]
    Upload(anyhow::Error),
    #[error("Failed to write message to the feed: {0:#}")]
    Write(anyhow::Error),
}

/// Sends messages as a fixed identity
///
/// Sent messages are not added to the render store directly; they are rendered when they come
/// back through the feed.
#[derive(Debug, Clone)]
pub struct OutgoingSender<B> {
    backend: B,
    identity: Identity,
    media: MediaSettings,
}

impl<B: Backend> OutgoingSender<B> {
    pub fn new(backend: B, identity: Identity, media: MediaSettings) -> Self {
        Self {
            backend,
            identity,
            media,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub async fn send_text(&self, text: &str) -> Result<(), SendError> {
        if text.trim().is_empty() {
            return Err(SendError::EmptyText);
        }
        self.write(RecordContent::Text {
            text: text.to_owned(),
        })
        .await?;
        info!(sender_id = %self.identity.sender_id, "Sent text message");
        Ok(())
    }

    /// Uploads a photo or video and sends a message referencing it.
    ///
    /// Photos are reencoded as JPEG. Nothing is written to the feed if the upload fails.
    /// Returns the download URL of the uploaded media.
    pub async fn send_media(&self, kind: MediaKind, media: LocalMedia) -> Result<Url, SendError> {
        if !kind.is_media() {
            return Err(SendError::NotMediaKind(kind));
        }
        let bytes = media.load().await?;

        let (content, content_type) = match kind {
            MediaKind::Photo => {
                let quality = self.media.jpeg_quality();
                let jpeg = tokio::task::spawn_blocking(move || reencode_jpeg(&bytes, quality))
                    .await
                    .map_err(|error| SendError::Processing(error.into()))?
                    .map_err(SendError::Processing)?;
                (jpeg, PHOTO_CONTENT_TYPE)
            }
            _ => {
                let content_type = infer::get(&bytes)
                    .filter(|mime| mime.matcher_type() == MatcherType::Video)
                    .map(|mime| mime.mime_type())
                    .unwrap_or(FALLBACK_VIDEO_CONTENT_TYPE);
                (bytes, content_type)
            }
        };

        let path_hint = self.path_hint();
        let size = content.len();
        let url = self
            .backend
            .upload(&path_hint, content, content_type)
            .await
            .map_err(SendError::Upload)?;
        info!(%kind, size, %path_hint, "Uploaded media");

        let record_content =
            RecordContent::media(kind, url.clone()).ok_or(SendError::NotMediaKind(kind))?;
        self.write(record_content).await?;
        Ok(url)
    }

    /// `{senderId}/{unix millis}-{random}`
    fn path_hint(&self) -> String {
        format!(
            "{}/{}-{}",
            self.identity.sender_id,
            Utc::now().timestamp_millis(),
            Uuid::new_v4()
        )
    }

    async fn write(&self, content: RecordContent) -> Result<(), SendError> {
        let record = FeedRecord {
            sender_id: self.identity.sender_id.clone(),
            sender_name: self.identity.display_name.clone(),
            content,
        };
        self.backend
            .append(&record)
            .await
            .map_err(SendError::Write)
    }
}
