// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory backend for tests

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::{anyhow, bail};
use bytes::Bytes;
use parking_lot::Mutex;
use parleycommon::{
    identifiers::SenderId,
    records::{FeedRecord, UserRecord},
};
use serde_json::Value;
use tokio::sync::{Notify, mpsc};
use tokio_stream::{Stream, StreamExt, wrappers::UnboundedReceiverStream};
use url::Url;

use crate::{
    backend::{BlobStore, FeedSource, FeedWriter, MediaFetcher, ProfileSource, ProfileWriter},
    store::{RenderSnapshot, RenderStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Upload {
    pub(crate) path_hint: String,
    pub(crate) content: Vec<u8>,
    pub(crate) content_type: String,
}

#[derive(Debug, Default)]
struct FakeBackendState {
    feed: Option<mpsc::UnboundedReceiver<Value>>,
    users: HashMap<SenderId, UserRecord>,
    blobs: HashMap<Url, Bytes>,
    gates: HashMap<Url, Arc<Notify>>,
    fail_uploads: bool,
    uploads: Vec<Upload>,
    records: Vec<FeedRecord>,
    profile_requests: Vec<SenderId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<FakeBackendState>>,
}

impl FakeBackend {
    /// Returns the backend and the sending end of its feed.
    pub(crate) fn new() -> (Self, mpsc::UnboundedSender<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Self::default();
        backend.state.lock().feed = Some(rx);
        (backend, tx)
    }

    pub(crate) fn add_user(&self, id: &str, display_name: &str, profile_url: &str) {
        let record = UserRecord {
            display_name: display_name.to_owned(),
            id: id.to_owned(),
            profile_url: profile_url.to_owned(),
        };
        self.state.lock().users.insert(id.parse().unwrap(), record);
    }

    pub(crate) fn add_blob(&self, url: &str, content: impl Into<Bytes>) {
        self.state
            .lock()
            .blobs
            .insert(url.parse().unwrap(), content.into());
    }

    /// Holds back the download of `url` until the returned gate is notified.
    pub(crate) fn gate(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .gates
            .insert(url.parse().unwrap(), gate.clone());
        gate
    }

    pub(crate) fn fail_uploads(&self) {
        self.state.lock().fail_uploads = true;
    }

    pub(crate) fn uploads(&self) -> Vec<Upload> {
        self.state.lock().uploads.clone()
    }

    pub(crate) fn records(&self) -> Vec<FeedRecord> {
        self.state.lock().records.clone()
    }

    pub(crate) fn user(&self, id: &str) -> Option<UserRecord> {
        let id: SenderId = id.parse().unwrap();
        self.state.lock().users.get(&id).cloned()
    }

    pub(crate) fn profile_requests(&self) -> Vec<SenderId> {
        self.state.lock().profile_requests.clone()
    }
}

impl FeedSource for FakeBackend {
    async fn subscribe(&self) -> anyhow::Result<impl Stream<Item = Value> + Send + 'static> {
        let rx = self
            .state
            .lock()
            .feed
            .take()
            .ok_or_else(|| anyhow!("feed already subscribed"))?;
        Ok(UnboundedReceiverStream::new(rx))
    }
}

impl FeedWriter for FakeBackend {
    async fn append(&self, record: &FeedRecord) -> anyhow::Result<()> {
        self.state.lock().records.push(record.clone());
        Ok(())
    }
}

impl ProfileSource for FakeBackend {
    async fn user_record(&self, sender_id: &SenderId) -> anyhow::Result<Option<UserRecord>> {
        let mut state = self.state.lock();
        state.profile_requests.push(sender_id.clone());
        Ok(state.users.get(sender_id).cloned())
    }
}

impl ProfileWriter for FakeBackend {
    async fn put_user_record(
        &self,
        sender_id: &SenderId,
        record: &UserRecord,
    ) -> anyhow::Result<()> {
        self.state
            .lock()
            .users
            .insert(sender_id.clone(), record.clone());
        Ok(())
    }
}

impl MediaFetcher for FakeBackend {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        let gate = self.state.lock().gates.get(url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.state
            .lock()
            .blobs
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {url}"))
    }
}

impl BlobStore for FakeBackend {
    async fn upload(
        &self,
        path_hint: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> anyhow::Result<Url> {
        let mut state = self.state.lock();
        if state.fail_uploads {
            bail!("403 Forbidden");
        }
        let url: Url =
            format!("https://storage.test/o/{}", path_hint.replace('/', "%2F")).parse()?;
        state.uploads.push(Upload {
            path_hint: path_hint.to_owned(),
            content: content.clone(),
            content_type: content_type.to_owned(),
        });
        state.blobs.insert(url.clone(), content.into());
        Ok(url)
    }
}

/// Waits until the snapshot of the store satisfies `predicate`.
pub(crate) async fn wait_for(
    store: &RenderStore,
    predicate: impl Fn(&RenderSnapshot) -> bool,
) -> RenderSnapshot {
    let mut notifications = store.subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = store.snapshot();
            if predicate(&snapshot) {
                return snapshot;
            }
            notifications.next().await;
        }
    })
    .await
    .expect("timed out waiting for the render store")
}
