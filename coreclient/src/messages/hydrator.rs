// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::Context;
use parleycommon::records::MediaKind;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::{backend::Backend, store::RenderStore, utils::image::dimensions};

use super::{MediaPayload, MessageId};

const FALLBACK_PHOTO_CONTENT_TYPE: &str = "image/jpeg";
const FALLBACK_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Downloads the media of placeholder messages and resolves them in the render store
#[derive(Debug, Clone)]
pub struct MessageHydrator<B> {
    backend: B,
    store: RenderStore,
}

impl<B: Backend> MessageHydrator<B> {
    pub fn new(backend: B, store: RenderStore) -> Self {
        Self { backend, store }
    }

    /// Hydrates a placeholder message in the background.
    pub fn hydrate(&self, message_id: MessageId, kind: MediaKind, url: Url) -> JoinHandle<()> {
        let hydrator = self.clone();
        tokio::spawn(async move { hydrator.hydrate_now(message_id, kind, &url).await })
    }

    /// Downloads the media of a message and stores it.
    ///
    /// On failure the message stays a placeholder.
    pub async fn hydrate_now(&self, message_id: MessageId, kind: MediaKind, url: &Url) {
        match self.load_media(kind, url).await {
            Ok(payload) => {
                debug!(%message_id, content_type = payload.content_type(), "Hydrated message");
                self.store.set_media(message_id, payload);
            }
            Err(error) => {
                warn!(%message_id, %url, %error, "Failed to hydrate message");
            }
        }
    }

    async fn load_media(&self, kind: MediaKind, url: &Url) -> anyhow::Result<MediaPayload> {
        let bytes = self
            .backend
            .fetch(url)
            .await
            .context("failed to download media")?;

        let fallback_content_type = match kind {
            MediaKind::Video => FALLBACK_VIDEO_CONTENT_TYPE,
            MediaKind::Text | MediaKind::Photo => FALLBACK_PHOTO_CONTENT_TYPE,
        };
        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(fallback_content_type);

        let size = if kind == MediaKind::Photo {
            let photo = bytes.clone();
            let size = tokio::task::spawn_blocking(move || dimensions(&photo))
                .await?
                .context("failed to decode photo")?;
            Some(size)
        } else {
            None
        };

        Ok(MediaPayload::new(bytes, content_type, size))
    }
}
