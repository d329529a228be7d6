// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Collaborators of the pipeline
//!
//! Every remote resource used by the pipeline is accessed through one of the traits in this
//! module. The production implementation is [`ApiClient`]; tests use in-memory doubles.

use std::future::Future;

use bytes::Bytes;
use parleyapiclient::ApiClient;
use parleycommon::{
    identifiers::SenderId,
    records::{FeedRecord, UserRecord},
};
use serde_json::Value;
use tokio_stream::{Stream, StreamExt};
use tracing::error;
use url::Url;

/// Source of the append-only message feed
pub trait FeedSource: Send + Sync {
    /// Subscribes to the feed.
    ///
    /// The stream yields raw records in arrival order and ends when the subscription ends.
    fn subscribe(
        &self,
    ) -> impl Future<Output = anyhow::Result<impl Stream<Item = Value> + Send + 'static>> + Send;
}

/// Persists outgoing messages to the feed
#[trait_variant::make(Send)]
pub trait FeedWriter {
    async fn append(&self, record: &FeedRecord) -> anyhow::Result<()>;
}

/// Lookup of user records by sender id
#[trait_variant::make(Send)]
pub trait ProfileSource {
    async fn user_record(&self, sender_id: &SenderId) -> anyhow::Result<Option<UserRecord>>;
}

/// Publishes the record of the own user
#[trait_variant::make(Send)]
pub trait ProfileWriter {
    async fn put_user_record(&self, sender_id: &SenderId, record: &UserRecord)
    -> anyhow::Result<()>;
}

/// Downloads media and avatar images
#[trait_variant::make(Send)]
pub trait MediaFetcher {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes>;
}

/// Stores blobs of outgoing media
#[trait_variant::make(Send)]
pub trait BlobStore {
    /// Uploads `content` and returns the URL under which it can be downloaded.
    async fn upload(&self, path_hint: &str, content: Vec<u8>, content_type: &str)
    -> anyhow::Result<Url>;
}

/// All collaborators of a chat client
pub trait Backend:
    FeedSource
    + FeedWriter
    + ProfileSource
    + ProfileWriter
    + MediaFetcher
    + BlobStore
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Backend for T where
    T: FeedSource
        + FeedWriter
        + ProfileSource
        + ProfileWriter
        + MediaFetcher
        + BlobStore
        + Clone
        + Send
        + Sync
        + 'static
{
}

impl FeedSource for ApiClient {
    async fn subscribe(&self) -> anyhow::Result<impl Stream<Item = Value> + Send + 'static> {
        let stream = self.subscribe_messages().await?;
        Ok(stream.map_while(|res| {
            res.inspect_err(|error| error!(%error, "terminating feed stream due to an error"))
                .ok()
        }))
    }
}

impl FeedWriter for ApiClient {
    async fn append(&self, record: &FeedRecord) -> anyhow::Result<()> {
        self.append_message(record).await?;
        Ok(())
    }
}

impl ProfileSource for ApiClient {
    async fn user_record(&self, sender_id: &SenderId) -> anyhow::Result<Option<UserRecord>> {
        Ok(ApiClient::user_record(self, sender_id).await?)
    }
}

impl ProfileWriter for ApiClient {
    async fn put_user_record(
        &self,
        sender_id: &SenderId,
        record: &UserRecord,
    ) -> anyhow::Result<()> {
        Ok(ApiClient::put_user_record(self, sender_id, record).await?)
    }
}

impl MediaFetcher for ApiClient {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        Ok(self.download(url).await?)
    }
}

impl BlobStore for ApiClient {
    async fn upload(
        &self,
        path_hint: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<Url> {
        Ok(self.upload_blob(path_hint, content, content_type).await?)
    }
}
