// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Records stored in the realtime database.
//!
//! The feed is schemaless on the backend side. These types describe the shape written by this
//! client. Readers must not assume that every record in the feed has this shape.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::identifiers::SenderId;

pub const MEDIA_TYPE_TEXT: &str = "TEXT";
pub const MEDIA_TYPE_PHOTO: &str = "PHOTO";
pub const MEDIA_TYPE_VIDEO: &str = "VIDEO";

/// Kind of content of a feed record (`mediaType` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "TEXT")]
    Text,
    #[serde(rename = "PHOTO")]
    Photo,
    #[serde(rename = "VIDEO")]
    Video,
}

impl MediaKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Text => MEDIA_TYPE_TEXT,
            MediaKind::Photo => MEDIA_TYPE_PHOTO,
            MediaKind::Video => MEDIA_TYPE_VIDEO,
        }
    }

    /// Whether the content is stored in the blob store and referenced by URL
    pub const fn is_media(&self) -> bool {
        matches!(self, MediaKind::Photo | MediaKind::Video)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown media type: {0}")]
pub struct UnknownMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            MEDIA_TYPE_TEXT => Ok(MediaKind::Text),
            MEDIA_TYPE_PHOTO => Ok(MediaKind::Photo),
            MEDIA_TYPE_VIDEO => Ok(MediaKind::Video),
            other => Err(UnknownMediaKind(other.to_owned())),
        }
    }
}

/// Content of a feed record
///
/// Text records carry their text inline, media records carry the download URL of the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mediaType")]
pub enum RecordContent {
    #[serde(rename = "TEXT")]
    Text { text: String },
    #[serde(rename = "PHOTO")]
    Photo {
        #[serde(rename = "fileURL")]
        file_url: Url,
    },
    #[serde(rename = "VIDEO")]
    Video {
        #[serde(rename = "fileURL")]
        file_url: Url,
    },
}

impl RecordContent {
    /// Builds the content of a media record; `None` for [`MediaKind::Text`].
    pub fn media(kind: MediaKind, file_url: Url) -> Option<Self> {
        match kind {
            MediaKind::Text => None,
            MediaKind::Photo => Some(Self::Photo { file_url }),
            MediaKind::Video => Some(Self::Video { file_url }),
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            RecordContent::Text { .. } => MediaKind::Text,
            RecordContent::Photo { .. } => MediaKind::Photo,
            RecordContent::Video { .. } => MediaKind::Video,
        }
    }

    pub fn file_url(&self) -> Option<&Url> {
        match self {
            RecordContent::Text { .. } => None,
            RecordContent::Photo { file_url } | RecordContent::Video { file_url } => Some(file_url),
        }
    }
}

/// A message as written to the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub sender_id: SenderId,
    pub sender_name: String,
    #[serde(flatten)]
    pub content: RecordContent,
}

/// A user as stored under `users/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "displayname", default)]
    pub display_name: String,
    #[serde(default)]
    pub id: String,
    /// URL of the avatar picture; empty for users without one
    #[serde(rename = "profileUrl", default)]
    pub profile_url: String,
}

impl UserRecord {
    /// The avatar URL, if the user has one.
    pub fn profile_url(&self) -> Option<&str> {
        let url = self.profile_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_json_snapshot;

    use super::*;

    #[test]
    fn text_record_wire_shape() {
        let record = FeedRecord {
            sender_id: "u1".parse().unwrap(),
            sender_name: "Amy".to_owned(),
            content: RecordContent::Text {
                text: "hi".to_owned(),
            },
        };
        assert_json_snapshot!(record, @r###"
        {
          "senderId": "u1",
          "senderName": "Amy",
          "mediaType": "TEXT",
          "text": "hi"
        }
        "###);
    }

    #[test]
    fn photo_record_wire_shape() {
        let record = FeedRecord {
            sender_id: "u2".parse().unwrap(),
            sender_name: "Bo".to_owned(),
            content: RecordContent::media(MediaKind::Photo, "http://x/y.jpg".parse().unwrap())
                .unwrap(),
        };
        assert_json_snapshot!(record, @r###"
        {
          "senderId": "u2",
          "senderName": "Bo",
          "mediaType": "PHOTO",
          "fileURL": "http://x/y.jpg"
        }
        "###);
    }

    #[test]
    fn media_content_requires_media_kind() {
        let url: Url = "http://x/y.mp4".parse().unwrap();
        assert_eq!(RecordContent::media(MediaKind::Text, url.clone()), None);
        let video = RecordContent::media(MediaKind::Video, url.clone()).unwrap();
        assert_eq!(video.kind(), MediaKind::Video);
        assert_eq!(video.file_url(), Some(&url));
    }

    #[test]
    fn media_kind_from_wire_name() {
        assert_eq!("PHOTO".parse::<MediaKind>(), Ok(MediaKind::Photo));
        assert_eq!(
            "AUDIO".parse::<MediaKind>(),
            Err(UnknownMediaKind("AUDIO".to_owned()))
        );
        assert!(!MediaKind::Text.is_media());
    }

    #[test]
    fn user_record_profile_url() {
        let user: UserRecord = serde_json::from_str(
            r#"{"displayname": "anonymous", "id": "u1", "profileUrl": ""}"#,
        )
        .unwrap();
        assert_eq!(user.display_name, "anonymous");
        assert_eq!(user.profile_url(), None);

        let user: UserRecord =
            serde_json::from_str(r#"{"profileUrl": "http://x/a.png"}"#).unwrap();
        assert_eq!(user.profile_url(), Some("http://x/a.png"));
    }
}
