// SPDX-FileCopyrightText: 2025 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Blob storage: uploads of sent media and downloads of received media

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::{ApiClient, RequestError};

/// Metadata of an uploaded object
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    /// Comma-separated list of download tokens
    #[serde(default)]
    download_tokens: Option<String>,
}

impl ApiClient {
    /// Uploads a blob under the given path and returns its download URL.
    pub async fn upload_blob(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<Url, RequestError> {
        let mut url = self.storage_endpoint(None)?;
        url.query_pairs_mut().append_pair("name", path);

        let size = content.len();
        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(content);
        if let Some(token) = &self.auth_token {
            request = request.header(AUTHORIZATION, format!("Firebase {token}"));
        }
        let metadata: ObjectMetadata = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|error| RequestError::BadResponse(error.to_string()))?;

        let mut download_url = self.storage_endpoint(Some(&metadata.name))?;
        {
            let mut query = download_url.query_pairs_mut();
            query.append_pair("alt", "media");
            let token = metadata
                .download_tokens
                .as_deref()
                .and_then(|tokens| tokens.split(',').next())
                .filter(|token| !token.is_empty());
            if let Some(token) = token {
                query.append_pair("token", token);
            }
        }
        info!(path, size, content_type, "Uploaded blob");
        Ok(download_url)
    }

    /// Downloads the content behind a URL, e.g. a media file or an avatar.
    pub async fn download(&self, url: &Url) -> Result<Bytes, RequestError> {
        debug!(%url, "Downloading");
        let bytes = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes)
    }
}
