// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use parleyapiclient::ApiClient;
use parleycommon::settings::Settings;
use parleycoreclient::{ChatClient, Identity, LocalMedia, MediaKind, RenderStore, SendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

use crate::message_list::MessageListCubit;

/// A running chat: the feed is watched until the session is stopped
pub struct ChatSession {
    client: ChatClient<ApiClient>,
    stop: CancellationToken,
    watcher: JoinHandle<()>,
}

impl ChatSession {
    /// Connects to the backend, publishes the user record of `identity` and starts watching the
    /// message feed.
    pub async fn start(settings: &Settings, identity: Identity) -> anyhow::Result<Self> {
        let api_client = ApiClient::with_default_http_client(&settings.backend)?;
        info!(sender_id = %identity.sender_id(), "Starting chat session");
        let client = ChatClient::new(api_client, identity, settings.media.clone());
        client.publish_profile().await?;
        let stop = CancellationToken::new();
        let watcher = client.feed_watcher().spawn(stop.clone());
        Ok(Self {
            client,
            stop,
            watcher,
        })
    }

    pub fn identity(&self) -> &Identity {
        self.client.identity()
    }

    pub fn store(&self) -> &RenderStore {
        self.client.store()
    }

    pub fn message_list(&self) -> MessageListCubit {
        MessageListCubit::new(
            self.client.store().clone(),
            self.client.identity().sender_id().clone(),
        )
    }

    pub async fn send_text(&self, text: &str) -> Result<(), SendError> {
        self.client.sender().send_text(text).await
    }

    pub async fn send_media(&self, kind: MediaKind, media: LocalMedia) -> Result<Url, SendError> {
        self.client.sender().send_media(kind, media).await
    }

    /// Stops watching the feed and waits until the watcher finished.
    pub async fn stop(self) {
        self.stop.cancel();
        if let Err(error) = self.watcher.await {
            error!(%error, "Feed watcher panicked");
        }
    }
}
