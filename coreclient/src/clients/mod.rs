// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use anyhow::Context;
use parleycommon::settings::MediaSettings;
use tracing::info;

use crate::{
    avatars::AvatarResolver,
    backend::Backend,
    feed::FeedWatcher,
    messages::hydrator::MessageHydrator,
    store::RenderStore,
};

use self::sender::{Identity, OutgoingSender};

pub mod sender;

/// Chat client wiring the pipeline to a backend
///
/// All components created by the client share the same render store.
#[derive(Debug, Clone)]
pub struct ChatClient<B> {
    backend: B,
    identity: Identity,
    media: MediaSettings,
    store: RenderStore,
}

impl<B: Backend> ChatClient<B> {
    pub fn new(backend: B, identity: Identity, media: MediaSettings) -> Self {
        Self {
            backend,
            identity,
            media,
            store: RenderStore::new(),
        }
    }

    pub fn store(&self) -> &RenderStore {
        &self.store
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn hydrator(&self) -> MessageHydrator<B> {
        MessageHydrator::new(self.backend.clone(), self.store.clone())
    }

    pub fn avatar_resolver(&self) -> AvatarResolver<B> {
        AvatarResolver::new(
            self.backend.clone(),
            self.store.clone(),
            self.media.avatar_diameter(),
        )
    }

    /// Creates a watcher of the message feed.
    ///
    /// The watcher is not running until it is spawned.
    pub fn feed_watcher(&self) -> FeedWatcher<B> {
        FeedWatcher::new(
            self.backend.clone(),
            self.store.clone(),
            self.hydrator(),
            self.avatar_resolver(),
        )
    }

    /// Publishes the user record of the own identity, so that other clients can resolve its
    /// avatar.
    pub async fn publish_profile(&self) -> anyhow::Result<()> {
        let sender_id = self.identity.sender_id();
        self.backend
            .put_user_record(sender_id, &self.identity.user_record())
            .await
            .context("failed to publish user record")?;
        info!(%sender_id, "Published user record");
        Ok(())
    }

    pub fn sender(&self) -> OutgoingSender<B> {
        OutgoingSender::new(
            self.backend.clone(),
            self.identity.clone(),
            self.media.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use crate::{
        Avatar, MessageContent,
        testing::{FakeBackend, wait_for},
        utils::image::tests::png_bytes,
    };

    use super::*;

    #[tokio::test]
    async fn sent_message_is_rendered_from_the_feed() {
        let (backend, feed) = FakeBackend::new();
        let client = ChatClient::new(
            backend.clone(),
            Identity::anonymous("u1".parse().unwrap()),
            MediaSettings::default(),
        );
        let stop = CancellationToken::new();
        let _watcher = client.feed_watcher().spawn(stop.clone());

        client.sender().send_text("hello").await.unwrap();
        for record in backend.records() {
            feed.send(serde_json::to_value(record).unwrap()).unwrap();
        }

        let own_id = client.identity().sender_id().clone();
        let snapshot = wait_for(client.store(), |snapshot| {
            snapshot.len() == 1 && snapshot.avatar(&own_id).is_some()
        })
        .await;
        let message = snapshot.message_at(0).unwrap();
        assert!(message.is_outgoing(&own_id));
        assert_eq!(message.sender_name(), "anonymous");
        assert_eq!(
            message.content(),
            &MessageContent::Text {
                text: "hello".to_owned()
            }
        );
        stop.cancel();
    }

    #[tokio::test]
    async fn published_profile_gives_own_avatar() {
        let (backend, feed) = FakeBackend::new();
        backend.add_blob("http://x/amy.png", png_bytes(32, 32));
        let identity = Identity::new("u1".parse().unwrap(), "Amy")
            .with_profile_url("http://x/amy.png".parse().unwrap());
        let client = ChatClient::new(backend.clone(), identity, MediaSettings::default());

        client.publish_profile().await.unwrap();
        let user = backend.user("u1").unwrap();
        assert_eq!(user.display_name, "Amy");
        assert_eq!(user.id, "u1");
        assert_eq!(user.profile_url(), Some("http://x/amy.png"));

        let stop = CancellationToken::new();
        let _watcher = client.feed_watcher().spawn(stop.clone());
        client.sender().send_text("hello").await.unwrap();
        for record in backend.records() {
            feed.send(serde_json::to_value(record).unwrap()).unwrap();
        }

        let own_id = client.identity().sender_id().clone();
        let snapshot = wait_for(client.store(), |snapshot| {
            matches!(snapshot.avatar(&own_id), Some(Avatar::Custom(_)))
        })
        .await;
        assert_eq!(snapshot.len(), 1);
        stop.cancel();
    }
}
