// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Message pipeline of the chat client.
//!
//! Raw records from the remote feed are classified by the [`FeedWatcher`], appended to the
//! [`RenderStore`] in arrival order, and hydrated in the background: media messages get their
//! bytes, senders get their avatar. Outgoing messages go through the [`OutgoingSender`].

pub mod avatars;
pub mod backend;
pub mod clients;
pub mod feed;
pub mod messages;
pub mod store;
mod utils;

#[cfg(test)]
mod testing;

pub use avatars::{Avatar, AvatarImage, AvatarResolver};
pub use backend::{
    Backend, BlobStore, FeedSource, FeedWriter, MediaFetcher, ProfileSource, ProfileWriter,
};
pub use clients::{
    ChatClient,
    sender::{Identity, LocalMedia, OutgoingSender, SendError},
};
pub use feed::{FeedWatcher, RecordError, classify};
pub use messages::{
    MediaPayload, MediaState, Message, MessageContent, MessageId, hydrator::MessageHydrator,
};
pub use store::{RenderSnapshot, RenderStore, StoreEntityId, StoreNotification};
pub use utils::image::render_default_avatar;

pub use parleycommon::{identifiers::SenderId, records::MediaKind};
