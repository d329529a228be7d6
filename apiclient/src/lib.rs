// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP client for the hosted backend: realtime database and blob storage

use std::time::Duration;

use parleycommon::settings::BackendSettings;
use reqwest::{Client, ClientBuilder};
use thiserror::Error;
use tracing::info;
use url::{ParseError, Url};

pub mod feed_api;
pub mod storage_api;
pub mod users_api;

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum ApiClientInitError {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error("Failed to parse URL {0}")]
    UrlParsingError(String),
    #[error("Invalid URL {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("Couldn't deserialize response body: {0}")]
    BadResponse(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type HttpClient = reqwest::Client;

// ApiClient is a wrapper around a reqwest client.
// It exposes a single function for each backend operation.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: HttpClient,
    database_url: Url,
    storage_url: Url,
    bucket: String,
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a new HTTP client.
    pub fn new_http_client() -> reqwest::Result<Client> {
        ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(4))
            .user_agent("ParleyClient/0.1")
            .build()
    }

    pub fn with_default_http_client(
        settings: &BackendSettings,
    ) -> Result<Self, ApiClientInitError> {
        let client = Self::new_http_client()?;
        Self::initialize(client, settings)
    }

    /// Creates a new API client talking to the backend described by `settings`.
    ///
    /// Both base URLs may be given without a scheme, in which case `https` is used.
    pub fn initialize(
        client: HttpClient,
        settings: &BackendSettings,
    ) -> Result<Self, ApiClientInitError> {
        let database_url = parse_base_url(&settings.database_url)?;
        let storage_url = parse_base_url(&settings.storage_url)?;
        info!(%database_url, %storage_url, bucket = %settings.bucket, "Initialized API client");
        Ok(Self {
            client,
            database_url,
            storage_url,
            bucket: settings.bucket.clone(),
            auth_token: settings.auth_token.clone(),
        })
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.client
    }

    /// Builds the URL of a location in the realtime database.
    ///
    /// Segments are percent-encoded. The auth token, if any, is added as query parameter.
    fn database_endpoint<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, RequestError> {
        let mut url = self.database_url.clone();
        url.path_segments_mut()
            .map_err(|_| RequestError::InvalidUrl(self.database_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    /// Builds the URL of the object collection of the configured bucket, optionally followed by
    /// an object name.
    fn storage_endpoint(&self, object_name: Option<&str>) -> Result<Url, RequestError> {
        let mut url = self.storage_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RequestError::InvalidUrl(self.storage_url.to_string()))?;
            segments.pop_if_empty().extend([
                "v0",
                "b",
                self.bucket.as_str(),
                parleycommon::endpoint_paths::ENDPOINT_STORAGE_OBJECTS,
            ]);
            if let Some(name) = object_name {
                segments.push(name);
            }
        }
        Ok(url)
    }
}

fn parse_base_url(base: &str) -> Result<Url, ApiClientInitError> {
    // We first check if the base is a valid URL.
    let url = match Url::parse(base) {
        Ok(url) => url,
        // If not, we try to parse it as a hostname.
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base = format!("https://{base}");
            Url::parse(&base).map_err(|_| ApiClientInitError::UrlParsingError(base))?
        }
        Err(_) => return Err(ApiClientInitError::UrlParsingError(base.to_owned())),
    };
    if url.cannot_be_a_base() {
        return Err(ApiClientInitError::InvalidUrl(base.to_owned()));
    }
    Ok(url)
}
