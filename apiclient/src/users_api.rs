// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use parleycommon::{endpoint_paths::ENDPOINT_USERS, identifiers::SenderId, records::UserRecord};
use tracing::debug;

use crate::{ApiClient, RequestError};

impl ApiClient {
    /// Loads the record of the user with the given id.
    ///
    /// Returns `None` if no such user exists.
    pub async fn user_record(
        &self,
        user_id: &SenderId,
    ) -> Result<Option<UserRecord>, RequestError> {
        let file_name = format!("{user_id}.json");
        let url = self.database_endpoint([ENDPOINT_USERS, file_name.as_str()])?;
        let record: Option<UserRecord> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|error| RequestError::BadResponse(error.to_string()))?;
        debug!(%user_id, found = record.is_some(), "Loaded user record");
        Ok(record)
    }

    /// Writes the record of the user with the given id, replacing any existing one.
    pub async fn put_user_record(
        &self,
        user_id: &SenderId,
        record: &UserRecord,
    ) -> Result<(), RequestError> {
        let file_name = format!("{user_id}.json");
        let url = self.database_endpoint([ENDPOINT_USERS, file_name.as_str()])?;
        self.client
            .put(url)
            .json(record)
            .send()
            .await?
            .error_for_status()?;
        debug!(%user_id, "Stored user record");
        Ok(())
    }
}
