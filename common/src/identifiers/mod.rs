// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fmt, str::FromStr};

use displaydoc::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Id of a user sending messages to the feed
///
/// The id is assigned by the authentication service of the backend and is opaque to the client.
/// The only requirement is that it is not empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SenderId {
    id: String,
}

impl SenderId {
    pub fn new(id: impl Into<String>) -> Result<Self, SenderIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SenderIdError::Empty);
        }
        Ok(Self { id })
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl AsRef<str> for SenderId {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl FromStr for SenderId {
    type Err = SenderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SenderId {
    type Error = SenderIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SenderId> for String {
    fn from(value: SenderId) -> Self {
        value.id
    }
}

#[derive(Debug, Error, Display, PartialEq, Eq)]
pub enum SenderIdError {
    /// Sender id is empty
    Empty,
}
