// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Access to the append-only message feed of the realtime database

use std::{
    collections::{HashSet, VecDeque},
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_util::Stream;
use parleycommon::{endpoint_paths::ENDPOINT_MESSAGES, records::FeedRecord};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::{ApiClient, RequestError};

use event_stream::{EventStreamParser, ServerSentEvent};

mod event_stream;

#[derive(Error, Debug)]
pub enum FeedStreamError {
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("Invalid {event} event: {error}")]
    InvalidEvent {
        event: String,
        error: serde_json::Error,
    },
    #[error("Feed subscription was cancelled by the server: {0}")]
    Cancelled(String),
    #[error("Authentication of the feed subscription was revoked")]
    AuthRevoked,
}

/// Response of a push to a list in the realtime database
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

impl ApiClient {
    /// Subscribes to the message feed.
    ///
    /// The returned stream yields every child of the feed exactly once, first the children
    /// existing at subscription time in key order, then every newly appended child. The values
    /// are untyped: the feed is not schema-enforced by the backend.
    pub async fn subscribe_messages(
        &self,
    ) -> Result<FeedStream<impl Stream<Item = reqwest::Result<Bytes>> + use<>>, RequestError> {
        let url = self.database_endpoint([ENDPOINT_MESSAGES])?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;
        info!("Subscribed to message feed");
        Ok(FeedStream::new(response.bytes_stream()))
    }

    /// Appends a record to the message feed.
    ///
    /// Returns the key assigned by the backend.
    pub async fn append_message(&self, record: &FeedRecord) -> Result<String, RequestError> {
        let url = self.database_endpoint([ENDPOINT_MESSAGES])?;
        let response: PushResponse = self
            .client
            .post(url)
            .json(record)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|error| RequestError::BadResponse(error.to_string()))?;
        debug!(key = %response.name, "Appended message to feed");
        Ok(response.name)
    }
}

/// Stream of raw feed children decoded from the server-sent events of a subscription
pub struct FeedStream<S> {
    inner: Pin<Box<S>>,
    parser: EventStreamParser,
    children: FeedChildren,
    pending: VecDeque<Value>,
    done: bool,
}

impl<S> FeedStream<S>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    fn new(byte_stream: S) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: EventStreamParser::new(),
            children: FeedChildren::default(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    fn process_event(&mut self, event: ServerSentEvent) -> Result<(), FeedStreamError> {
        let added = self.children.apply(event)?;
        self.pending.extend(added);
        Ok(())
    }
}

impl<S> Stream for FeedStream<S>
where
    S: Stream<Item = reqwest::Result<Bytes>>,
{
    type Item = Result<Value, FeedStreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(child) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(child)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    for event in this.parser.feed(&chunk) {
                        if let Err(error) = this.process_event(event) {
                            this.done = true;
                            return Poll::Ready(Some(Err(error)));
                        }
                    }
                }
                Poll::Ready(Some(Err(error))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(error.into())));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    if let Some(event) = this.parser.finish() {
                        if let Err(error) = this.process_event(event) {
                            return Poll::Ready(Some(Err(error)));
                        }
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Body of `put` and `patch` events
#[derive(Debug, Deserialize)]
struct PathData {
    path: String,
    data: Value,
}

/// Tracks which children of the feed were already emitted.
///
/// The feed is append-only: removals and changes of existing children are ignored.
#[derive(Debug, Default)]
struct FeedChildren {
    seen: HashSet<String>,
}

impl FeedChildren {
    /// Applies an event and returns the newly added children.
    fn apply(&mut self, event: ServerSentEvent) -> Result<Vec<Value>, FeedStreamError> {
        match event.event.as_str() {
            "put" | "patch" => {
                let PathData { path, data } =
                    serde_json::from_str(&event.data).map_err(|error| {
                        FeedStreamError::InvalidEvent {
                            event: event.event.clone(),
                            error,
                        }
                    })?;
                Ok(self.added_children(&path, data))
            }
            "keep-alive" => Ok(Vec::new()),
            "cancel" => Err(FeedStreamError::Cancelled(event.data)),
            "auth_revoked" => Err(FeedStreamError::AuthRevoked),
            other => {
                debug!(event = other, "Ignoring unknown feed event");
                Ok(Vec::new())
            }
        }
    }

    fn added_children(&mut self, path: &str, data: Value) -> Vec<Value> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            // root: data holds children by key, keys are ordered chronologically
            [] => match data {
                Value::Object(children) => {
                    let mut children: Vec<(String, Value)> = children.into_iter().collect();
                    children.sort_by(|(a, _), (b, _)| a.cmp(b));
                    children
                        .into_iter()
                        .filter_map(|(key, child)| self.add(key, child))
                        .collect()
                }
                _ => Vec::new(),
            },
            [key] => self.add((*key).to_owned(), data).into_iter().collect(),
            _ => {
                trace!(path, "Ignoring change of an existing child");
                Vec::new()
            }
        }
    }

    fn add(&mut self, key: String, child: Value) -> Option<Value> {
        if child.is_null() || self.seen.contains(&key) {
            return None;
        }
        trace!(%key, "New feed child");
        self.seen.insert(key);
        Some(child)
    }
}
