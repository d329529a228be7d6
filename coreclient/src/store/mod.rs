// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory render store
//!
//! The store owns the ordered message sequence and the sender → avatar map. Readers take an
//! immutable [`RenderSnapshot`]; writers replace the shared state copy-on-write, so a snapshot
//! is never affected by later writes. Every write sends a [`StoreNotification`] to all
//! subscribers.
//!
//! The state is held in persistent collections: a write next to a live snapshot shares all
//! untouched messages with it and only copies the one it changes.

use std::sync::Arc;

use imbl::{HashMap, Vector};
use parking_lot::RwLock;
use parleycommon::identifiers::SenderId;
use tokio_stream::Stream;
use tracing::{debug, trace};

use crate::{
    avatars::Avatar,
    messages::{MediaPayload, MediaState, Message, MessageContent, MessageId},
};

pub use entity_id::StoreEntityId;
pub use notification::{StoreNotification, StoreNotificationBuilder};

use notification::StoreNotificationsSender;

mod entity_id;
mod notification;

#[derive(Debug, Clone, Default)]
struct RenderState {
    messages: Vector<Arc<Message>>,
    avatars: HashMap<SenderId, Avatar>,
}

#[derive(Debug, Default)]
struct RenderStoreInner {
    state: RwLock<Arc<RenderState>>,
    notifications: StoreNotificationsSender,
}

/// Shared handle to the render store
///
/// Cloning the handle is cheap; all clones refer to the same store.
#[derive(Debug, Clone, Default)]
pub struct RenderStore {
    inner: Arc<RenderStoreInner>,
}

impl RenderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message at the end of the sequence and returns its id.
    pub fn append(
        &self,
        sender_id: SenderId,
        sender_name: String,
        content: MessageContent,
    ) -> MessageId {
        // the guard is dropped after the lock, so subscribers see the new state
        let mut notification = self.inner.notifications.notify_on_drop();
        let mut state = self.inner.state.write();
        let state = Arc::make_mut(&mut *state);
        let id = MessageId::new(state.messages.len() as u64);
        trace!(%id, %sender_id, kind = %content.kind(), "Appending message");
        state.messages.push_back(Arc::new(Message::new(
            id,
            sender_id,
            sender_name,
            content,
        )));
        notification.add(id);
        id
    }

    /// Resolves the media slot of a message.
    ///
    /// Returns `false` if there is no such message or if it has no media slot.
    pub fn set_media(&self, message_id: MessageId, payload: MediaPayload) -> bool {
        let mut notification = self.inner.notifications.notify_on_drop();
        let mut state = self.inner.state.write();
        let Some(index) = message_id
            .index()
            .filter(|&index| index < state.messages.len())
        else {
            debug!(%message_id, "Media for unknown message");
            return false;
        };
        if state.messages[index].content().media().is_none() {
            debug!(%message_id, "Media for message without media slot");
            return false;
        }
        let state = Arc::make_mut(&mut *state);
        let message = Arc::make_mut(&mut state.messages[index]);
        if let Some(media) = message.content_mut().media_mut() {
            *media = MediaState::Ready(Arc::new(payload));
        }
        notification.update(message_id);
        true
    }

    /// Sets the avatar of a sender, replacing any previous one.
    pub fn set_avatar(&self, sender_id: SenderId, avatar: Avatar) {
        let mut notification = self.inner.notifications.notify_on_drop();
        let mut state = self.inner.state.write();
        let state = Arc::make_mut(&mut *state);
        match state.avatars.insert(sender_id.clone(), avatar) {
            None => notification.add(sender_id),
            Some(_) => notification.update(sender_id),
        };
    }

    /// Sets the default avatar for a sender without an avatar.
    ///
    /// Returns whether the avatar was set.
    pub fn set_default_avatar_if_missing(&self, sender_id: &SenderId) -> bool {
        let mut notification = self.inner.notifications.notify_on_drop();
        let mut state = self.inner.state.write();
        if state.avatars.contains_key(sender_id) {
            return false;
        }
        Arc::make_mut(&mut *state)
            .avatars
            .insert(sender_id.clone(), Avatar::Default);
        notification.add(sender_id.clone());
        true
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            state: self.inner.state.read().clone(),
        }
    }

    /// Subscribes to the changes of the store.
    ///
    /// Only changes made after subscribing are delivered.
    pub fn subscribe(
        &self,
    ) -> impl Stream<Item = Arc<StoreNotification>> + Send + Unpin + use<> {
        self.inner.notifications.subscribe()
    }
}

/// Immutable view of the render store at one point in time
#[derive(Debug, Clone, Default)]
pub struct RenderSnapshot {
    state: Arc<RenderState>,
}

impl RenderSnapshot {
    /// Messages in display order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.state.messages.iter().map(Arc::as_ref)
    }

    /// Message at the given display position
    pub fn message_at(&self, index: usize) -> Option<&Message> {
        self.state.messages.get(index).map(Arc::as_ref)
    }

    pub fn message(&self, message_id: MessageId) -> Option<&Message> {
        self.message_at(message_id.index()?)
    }

    pub fn avatar(&self, sender_id: &SenderId) -> Option<&Avatar> {
        self.state.avatars.get(sender_id)
    }

    pub fn avatars(&self) -> impl Iterator<Item = (&SenderId, &Avatar)> {
        self.state.avatars.iter()
    }

    pub fn len(&self) -> usize {
        self.state.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.messages.is_empty()
    }
}
