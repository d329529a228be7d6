// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

use tokio::sync::broadcast;
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::error;

use super::StoreEntityId;

// 1024 * size_of::<Arc<StoreNotification>>() = 1024 * 8 = 8 KiB
const NOTIFICATION_CHANNEL_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub(crate) struct StoreNotificationsSender {
    tx: broadcast::Sender<Arc<StoreNotification>>,
}

impl StoreNotificationsSender {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_SIZE);
        Self { tx }
    }

    pub(crate) fn notify(&self, notification: Arc<StoreNotification>) {
        let _no_receivers = self.tx.send(notification);
    }

    /// Collects changes and sends them as a single notification when dropped.
    pub(crate) fn notify_on_drop(&self) -> StoreNotificationGuard<'_> {
        StoreNotificationGuard {
            tx: self,
            builder: StoreNotificationBuilder::default(),
        }
    }

    pub(crate) fn subscribe(
        &self,
    ) -> impl Stream<Item = Arc<StoreNotification>> + Send + Unpin + use<> {
        BroadcastStream::new(self.tx.subscribe()).map(|res| match res {
            Ok(notification) => notification,
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                error!(n, "store notifications lagged");
                Arc::new(StoreNotification::default())
            }
        })
    }
}

impl Default for StoreNotificationsSender {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct StoreNotificationGuard<'a> {
    tx: &'a StoreNotificationsSender,
    builder: StoreNotificationBuilder,
}

impl Deref for StoreNotificationGuard<'_> {
    type Target = StoreNotificationBuilder;

    fn deref(&self) -> &Self::Target {
        &self.builder
    }
}

impl DerefMut for StoreNotificationGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.builder
    }
}

impl Drop for StoreNotificationGuard<'_> {
    fn drop(&mut self) {
        if !self.builder.is_empty() {
            let notification = self.builder.build();
            self.tx.notify(notification);
        }
    }
}

/// Change notification of the render store
///
/// An empty notification is sent when a subscriber lagged behind; it still means that the
/// subscriber has to redraw.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StoreNotification {
    pub added: Vec<StoreEntityId>,
    pub updated: Vec<StoreEntityId>,
}

impl StoreNotification {
    pub fn contains_added(&self, id: &StoreEntityId) -> bool {
        self.added.binary_search(id).is_ok()
    }

    pub fn contains_updated(&self, id: &StoreEntityId) -> bool {
        self.updated.binary_search(id).is_ok()
    }

    /// Whether the notification touches the given entity at all
    pub fn contains(&self, id: &StoreEntityId) -> bool {
        self.contains_added(id) || self.contains_updated(id)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct StoreNotificationBuilder {
    inner: StoreNotification,
}

impl StoreNotificationBuilder {
    pub(crate) fn add(&mut self, id: impl Into<StoreEntityId>) -> &mut Self {
        self.inner.added.push(id.into());
        self
    }

    pub(crate) fn update(&mut self, id: impl Into<StoreEntityId>) -> &mut Self {
        self.inner.updated.push(id.into());
        self
    }

    pub(crate) fn build(&mut self) -> Arc<StoreNotification> {
        let mut inner = std::mem::take(&mut self.inner);
        inner.added.shrink_to_fit();
        inner.updated.shrink_to_fit();
        inner.added.sort_unstable();
        inner.updated.sort_unstable();
        Arc::new(inner)
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
