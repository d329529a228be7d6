// SPDX-FileCopyrightText: 2024 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Deserialize;

/// Configuration of the chat client.
#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub backend: BackendSettings,
    #[serde(default)]
    pub media: MediaSettings,
}

/// Location of the hosted backend.
#[derive(Deserialize, Clone, Debug)]
pub struct BackendSettings {
    /// Base URL of the realtime database, e.g. `https://project.firebaseio.com/`
    pub database_url: String,
    /// Base URL of the storage API, e.g. `https://firebasestorage.googleapis.com/`
    pub storage_url: String,
    pub bucket: String,
    // If this isn't present, requests are sent unauthenticated.
    pub auth_token: Option<String>,
}

/// Encoding parameters of media shown in and sent to the chat.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MediaSettings {
    #[serde(default = "MediaSettings::default_avatar_diameter")]
    pub avatar_diameter: u32,
    #[serde(default = "MediaSettings::default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl MediaSettings {
    pub const DEFAULT_AVATAR_DIAMETER: u32 = 30;
    pub const DEFAULT_JPEG_QUALITY: u8 = 80;

    fn default_avatar_diameter() -> u32 {
        Self::DEFAULT_AVATAR_DIAMETER
    }

    fn default_jpeg_quality() -> u8 {
        Self::DEFAULT_JPEG_QUALITY
    }

    /// JPEG quality of uploaded photos in the range `1..=100`
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }

    /// Diameter of avatars in pixels, at least 1
    pub fn avatar_diameter(&self) -> u32 {
        self.avatar_diameter.max(1)
    }
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            avatar_diameter: Self::DEFAULT_AVATAR_DIAMETER,
            jpeg_quality: Self::DEFAULT_JPEG_QUALITY,
        }
    }
}
