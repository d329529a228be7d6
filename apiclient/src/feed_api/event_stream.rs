// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Incremental parser for `text/event-stream` bodies

/// A dispatched server-sent event
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ServerSentEvent {
    /// Event type; `message` if the event did not name one
    pub(crate) event: String,
    pub(crate) data: String,
}

/// Splits a byte stream into server-sent events.
///
/// Chunks may end anywhere, also in the middle of a line or a UTF-8 sequence. Only complete lines
/// are interpreted.
#[derive(Debug, Default)]
pub(crate) struct EventStreamParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl EventStreamParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of the body and returns the events completed by it.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<ServerSentEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line[..newline_pos]);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }
        events
    }

    /// Dispatches a pending event at the end of the body, if the server did not terminate it
    /// with a blank line.
    pub(crate) fn finish(&mut self) -> Option<ServerSentEvent> {
        if !self.buffer.is_empty() {
            let line = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<ServerSentEvent> {
        // blank line terminates the event
        if line.is_empty() {
            return self.dispatch();
        }
        // comment
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_owned()),
            "data" => self.data.push(value.to_owned()),
            // `id` and `retry` are not used by the feed
            _ => (),
        }
        None
    }

    fn dispatch(&mut self) -> Option<ServerSentEvent> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(ServerSentEvent {
            event: event.unwrap_or_else(|| "message".to_owned()),
            data,
        })
    }
}
