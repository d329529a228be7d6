// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Application logic of the chat client

pub mod configurations;
pub mod logging;
pub mod message_list;
pub mod session;

pub use message_list::{MessageListCubit, MessageListState};
pub use session::ChatSession;
