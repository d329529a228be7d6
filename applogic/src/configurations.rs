// SPDX-FileCopyrightText: 2023 Phoenix R&D GmbH <hello@phnx.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{fmt, str::FromStr};

use config::{Config, ConfigError, File, FileFormat, Source};
use parleycommon::settings::Settings;

/// Variable selecting the environment file loaded on top of `base`
const ENVIRONMENT_VARIABLE: &str = "APP_ENVIRONMENT";

/// Deployment the client talks to; selects `configuration/{environment}.yaml`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Local,
    Production,
}

impl Environment {
    /// Reads the environment from `APP_ENVIRONMENT`, falling back to [`Environment::Local`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(ENVIRONMENT_VARIABLE) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Local => "local",
            Environment::Production => "production",
        })
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            Ok(Self::Local)
        } else if s.eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else {
            Err(ConfigError::Message(format!(
                "unknown environment `{s}` in {ENVIRONMENT_VARIABLE}, expected `local` or `production`"
            )))
        }
    }
}

/// Loads `configuration/base.yaml` below `prefix`, the optional file of the current
/// [`Environment`] and `PARLEY_*` environment variables, in increasing precedence.
pub fn get_configuration(prefix: &str) -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir().map_err(|error| {
        ConfigError::Message(format!("Failed to determine the current directory: {error}"))
    })?;
    let configuration_directory = base_path.join(format!("{prefix}configuration"));
    let environment = Environment::from_env()?;

    get_configuration_impl(
        File::from(configuration_directory.join("base")).required(true),
        File::from(configuration_directory.join(environment.to_string())).required(false),
    )
}

/// Load the configuration from the given configuration strings (in YAML format).
pub fn get_configuration_from_str(base: &str, environment: &str) -> Result<Settings, ConfigError> {
    get_configuration_impl(
        File::from_str(base, FileFormat::Yaml),
        File::from_str(environment, FileFormat::Yaml),
    )
}

fn get_configuration_impl(
    base: impl Source + Send + Sync + 'static,
    environment: impl Source + Send + Sync + 'static,
) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(base)
        .add_source(environment)
        // E.g. `PARLEY_BACKEND__AUTH_TOKEN=secret` sets `Settings.backend.auth_token`
        .add_source(
            config::Environment::with_prefix("PARLEY")
                .prefix_separator("_")
                .separator("__"),
        );
    builder.build()?.try_deserialize()
}
