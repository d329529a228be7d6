// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{pin::pin, sync::Arc};

use parleycoreclient::{
    Avatar, Message, RenderSnapshot, RenderStore, SenderId, StoreNotification,
};
use tokio::sync::watch;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// State of the message list of the chat screen
///
/// Cheap to clone: the messages are shared with the render store snapshot it was built from.
#[derive(Debug, Clone)]
pub struct MessageListState {
    snapshot: RenderSnapshot,
    own_sender_id: SenderId,
}

impl MessageListState {
    fn new(snapshot: RenderSnapshot, own_sender_id: SenderId) -> Self {
        Self {
            snapshot,
            own_sender_id,
        }
    }

    pub fn loaded_messages_count(&self) -> usize {
        self.snapshot.len()
    }

    pub fn message_at(&self, index: usize) -> Option<Message> {
        self.snapshot.message_at(index).cloned()
    }

    /// Avatar of the sender of the message at `index`, if already resolved
    pub fn avatar_at(&self, index: usize) -> Option<Avatar> {
        let message = self.snapshot.message_at(index)?;
        self.snapshot.avatar(message.sender_id()).cloned()
    }

    /// Whether the message at `index` was sent by the own user
    pub fn is_outgoing(&self, index: usize) -> bool {
        self.snapshot
            .message_at(index)
            .is_some_and(|message| message.is_outgoing(&self.own_sender_id))
    }

    pub fn snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }
}

/// Keeps a [`MessageListState`] up to date with the render store until closed
pub struct MessageListCubit {
    state_tx: watch::Sender<MessageListState>,
    cancel: CancellationToken,
}

impl Drop for MessageListCubit {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl MessageListCubit {
    /// Must be called inside a tokio runtime.
    pub fn new(store: RenderStore, own_sender_id: SenderId) -> Self {
        let store_notifications = store.subscribe();
        let initial_state = MessageListState::new(store.snapshot(), own_sender_id.clone());
        let (state_tx, _) = watch::channel(initial_state);
        let cancel = CancellationToken::new();

        MessageListContext {
            store,
            state_tx: state_tx.clone(),
            own_sender_id,
        }
        .spawn(store_notifications, cancel.clone());

        Self { state_tx, cancel }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn close(&mut self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> MessageListState {
        self.state_tx.borrow().clone()
    }

    /// Receiver of all future states; the current state is marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<MessageListState> {
        self.state_tx.subscribe()
    }
}

struct MessageListContext {
    store: RenderStore,
    state_tx: watch::Sender<MessageListState>,
    own_sender_id: SenderId,
}

impl MessageListContext {
    fn spawn(
        self,
        store_notifications: impl Stream<Item = Arc<StoreNotification>> + Send + 'static,
        stop: CancellationToken,
    ) {
        tokio::spawn(async move {
            self.store_notifications_loop(store_notifications, stop)
                .await;
        });
    }

    async fn store_notifications_loop(
        &self,
        store_notifications: impl Stream<Item = Arc<StoreNotification>>,
        stop: CancellationToken,
    ) {
        let mut store_notifications = pin!(store_notifications);
        loop {
            let res = tokio::select! {
                _ = stop.cancelled() => return,
                notification = store_notifications.next() => notification,
            };
            match res {
                Some(notification) => {
                    trace!(?notification, "MessageListCubit::store_notification");
                    self.emit_state();
                }
                None => return,
            }
        }
    }

    fn emit_state(&self) {
        let state = MessageListState::new(self.store.snapshot(), self.own_sender_id.clone());
        self.state_tx.send_replace(state);
    }
}
