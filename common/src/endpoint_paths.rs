// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Paths of the hosted backend, relative to the configured base URLs.

/// Append-only message feed in the realtime database
pub const ENDPOINT_MESSAGES: &str = "messages.json";

/// User records in the realtime database, followed by `/{id}.json`
pub const ENDPOINT_USERS: &str = "users";

/// Object collection of a storage bucket, preceded by `v0/b/{bucket}`
pub const ENDPOINT_STORAGE_OBJECTS: &str = "o";
