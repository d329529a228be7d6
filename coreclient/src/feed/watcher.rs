// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::pin::pin;

use parleycommon::records::FeedRecord;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    avatars::AvatarResolver,
    backend::Backend,
    messages::{MessageId, hydrator::MessageHydrator},
    store::RenderStore,
};

use super::{classify, sender_id_of};

/// Watches the message feed and feeds new messages into the render store
///
/// Every record is appended in arrival order. Media messages are appended as placeholders and
/// hydrated in the background. The avatar of a sender is resolved in the background unless a
/// resolution for that sender is still pending.
#[derive(Debug)]
pub struct FeedWatcher<B> {
    backend: B,
    store: RenderStore,
    hydrator: MessageHydrator<B>,
    avatars: AvatarResolver<B>,
}

impl<B: Backend> FeedWatcher<B> {
    pub fn new(
        backend: B,
        store: RenderStore,
        hydrator: MessageHydrator<B>,
        avatars: AvatarResolver<B>,
    ) -> Self {
        Self {
            backend,
            store,
            hydrator,
            avatars,
        }
    }

    /// Subscribes to the feed and processes records until the feed ends or `stop` is cancelled.
    ///
    /// Background work already scheduled keeps running after the watcher stopped.
    pub fn spawn(self, stop: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(stop))
    }

    async fn run(self, stop: CancellationToken) {
        let records = match self.backend.subscribe().await {
            Ok(records) => records,
            Err(error) => {
                error!(%error, "Failed to subscribe to the message feed");
                return;
            }
        };
        let mut records = pin!(records);
        info!("Watching message feed");

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    info!("Stopped watching message feed");
                    return;
                }
                record = records.next() => match record {
                    Some(record) => {
                        self.ingest(record);
                    }
                    None => {
                        warn!("Message feed ended");
                        return;
                    }
                },
            }
        }
    }

    /// Processes a single raw record.
    ///
    /// Returns the id of the appended message, or `None` if the record was dropped.
    pub fn ingest(&self, raw: Value) -> Option<MessageId> {
        let message_id = match classify(&raw) {
            Ok(FeedRecord {
                sender_id,
                sender_name,
                content,
            }) => {
                let kind = content.kind();
                let file_url = content.file_url().cloned();
                let message_id = self.store.append(sender_id, sender_name, content.into());
                if let Some(url) = file_url {
                    self.hydrator.hydrate(message_id, kind, url);
                }
                Some(message_id)
            }
            Err(error) => {
                warn!(%error, "Dropping feed record");
                None
            }
        };

        if let Some(sender_id) = sender_id_of(&raw) {
            self.avatars.resolve(sender_id);
        }

        message_id
    }
}
