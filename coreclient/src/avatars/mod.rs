// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{collections::HashSet, fmt, sync::Arc};

use anyhow::Context;
use bytes::Bytes;
use parking_lot::Mutex;
use parleycommon::identifiers::SenderId;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use url::Url;

use crate::{backend::Backend, store::RenderStore, utils::image::circular_avatar};

/// Avatar of a sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    /// The built-in avatar, see [`crate::render_default_avatar`]
    Default,
    Custom(AvatarImage),
}

impl Avatar {
    pub fn is_default(&self) -> bool {
        matches!(self, Avatar::Default)
    }
}

/// Circular avatar image encoded as PNG
#[derive(Clone, PartialEq, Eq)]
pub struct AvatarImage {
    png: Bytes,
    diameter: u32,
}

impl fmt::Debug for AvatarImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarImage")
            .field("png", &self.png.len())
            .field("diameter", &self.diameter)
            .finish()
    }
}

impl AvatarImage {
    pub fn new(png: Bytes, diameter: u32) -> Self {
        Self { png, diameter }
    }

    pub fn png(&self) -> &Bytes {
        &self.png
    }

    pub fn diameter(&self) -> u32 {
        self.diameter
    }
}

/// Resolves the avatars of senders into the render store
///
/// At most one background resolution runs per sender; clones share the set of pending senders.
#[derive(Debug, Clone)]
pub struct AvatarResolver<B> {
    backend: B,
    store: RenderStore,
    diameter: u32,
    pending: Arc<Mutex<HashSet<SenderId>>>,
}

/// Removes a sender from the pending set when its resolution ends
struct PendingResolution {
    pending: Arc<Mutex<HashSet<SenderId>>>,
    sender_id: SenderId,
}

impl Drop for PendingResolution {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.sender_id);
    }
}

impl<B: Backend> AvatarResolver<B> {
    pub fn new(backend: B, store: RenderStore, diameter: u32) -> Self {
        Self {
            backend,
            store,
            diameter,
            pending: Default::default(),
        }
    }

    /// Resolves the avatar of a sender in the background.
    ///
    /// Returns `None` without doing anything if a resolution for the sender is still pending.
    pub fn resolve(&self, sender_id: SenderId) -> Option<JoinHandle<()>> {
        if !self.pending.lock().insert(sender_id.clone()) {
            trace!(%sender_id, "Avatar resolution already pending");
            return None;
        }
        let pending = PendingResolution {
            pending: self.pending.clone(),
            sender_id,
        };
        let resolver = self.clone();
        Some(tokio::spawn(async move {
            resolver.resolve_now(&pending.sender_id).await;
            drop(pending);
        }))
    }

    /// Resolves the avatar of a sender and stores it.
    ///
    /// Never fails: if the avatar cannot be resolved, the sender keeps its current avatar, or gets
    /// the default avatar if it has none yet.
    pub async fn resolve_now(&self, sender_id: &SenderId) {
        match self.load_avatar(sender_id).await {
            Ok(avatar) => {
                debug!(%sender_id, is_default = avatar.is_default(), "Resolved avatar");
                self.store.set_avatar(sender_id.clone(), avatar);
            }
            Err(error) => {
                warn!(%sender_id, %error, "Failed to resolve avatar");
                self.store.set_default_avatar_if_missing(sender_id);
            }
        }
    }

    async fn load_avatar(&self, sender_id: &SenderId) -> anyhow::Result<Avatar> {
        let user = self
            .backend
            .user_record(sender_id)
            .await
            .context("failed to look up user")?;
        let Some(profile_url) = user.as_ref().and_then(|user| user.profile_url()) else {
            return Ok(Avatar::Default);
        };
        let url = Url::parse(profile_url).context("invalid profile url")?;
        let bytes = self
            .backend
            .fetch(&url)
            .await
            .context("failed to download profile image")?;
        let diameter = self.diameter;
        let png = tokio::task::spawn_blocking(move || circular_avatar(&bytes, diameter))
            .await?
            .context("failed to render profile image")?;
        Ok(Avatar::Custom(AvatarImage::new(png.into(), diameter)))
    }
}
