// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use parleycommon::identifiers::SenderId;

use crate::MessageId;

/// Entity of the render store a notification refers to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub enum StoreEntityId {
    Message(MessageId),
    Avatar(SenderId),
}
