// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Common data model used by the api client and the core client.

pub mod endpoint_paths;
pub mod identifiers;
pub mod records;
pub mod settings;
