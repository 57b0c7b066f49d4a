// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration for RouterOS API connections
//!
//! Loads router entries from environment variables and JSON.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::mikrotik::{ConnectOptions, LoginMethod};

#[cfg(test)]
mod tests;

/// Default configuration values
pub mod defaults {
    pub const ROUTEROS_USERNAME: &str = "admin";
    pub const ROUTEROS_PASSWORD: &str = "";
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;
    pub const READ_TIMEOUT_SECS: u64 = 30;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const ROUTERS_CONFIG: &str = "ROUTERS_CONFIG";
    pub const ROUTEROS_ADDRESS: &str = "ROUTEROS_ADDRESS";
    pub const ROUTEROS_USERNAME: &str = "ROUTEROS_USERNAME";
    pub const ROUTEROS_PASSWORD: &str = "ROUTEROS_PASSWORD";
    pub const ROUTEROS_LOGIN: &str = "ROUTEROS_LOGIN";
    pub const ROUTEROS_CONNECT_TIMEOUT: &str = "ROUTEROS_CONNECT_TIMEOUT";
    pub const ROUTEROS_READ_TIMEOUT: &str = "ROUTEROS_READ_TIMEOUT";
}

fn default_connect_timeout() -> Option<u64> {
    Some(defaults::CONNECT_TIMEOUT_SECS)
}

fn default_read_timeout() -> Option<u64> {
    Some(defaults::READ_TIMEOUT_SECS)
}

/// Connection settings for a single RouterOS device
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    pub name: String,
    /// `host:port`
    pub address: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub login: LoginMethod,
    /// TCP connect deadline, `null` to wait indefinitely
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: Option<u64>,
    /// Socket read/write deadline, `null` to wait indefinitely
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: Option<u64>,
}

impl RouterConfig {
    /// Validates router configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("Router name cannot be empty".to_string()));
        }

        // Address must carry a port
        if !self.address.contains(':') {
            return Err(Error::Config(format!(
                "Invalid address format '{}': expected 'host:port'",
                self.address
            )));
        }

        if self.username.trim().is_empty() {
            return Err(Error::Config(format!(
                "Username cannot be empty for router '{}'",
                self.name
            )));
        }

        Ok(())
    }

    /// Connection options derived from this entry
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new().with_login(self.login);
        if let Some(secs) = self.connect_timeout_secs.filter(|s| *s > 0) {
            options = options.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.read_timeout_secs.filter(|s| *s > 0) {
            options = options.with_io_timeout(Duration::from_secs(secs));
        }
        options
    }
}

/// Application-wide configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub routers: Vec<RouterConfig>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// `ROUTERS_CONFIG` holds a JSON array of router entries. Without it a
    /// single router is built from the `ROUTEROS_*` variables. Invalid entries
    /// are logged and dropped.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let routers = if let Ok(config_json) = std::env::var(env_vars::ROUTERS_CONFIG) {
            Self::parse_routers(&config_json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse ROUTERS_CONFIG: {}. Using empty list.", e);
                vec![]
            })
        } else if let Some(router) = Self::router_from_vars(|key| std::env::var(key).ok()) {
            vec![router]
        } else {
            tracing::warn!("No router configuration found");
            vec![]
        };

        Self::from_routers(routers)
    }

    /// Keeps only entries that pass [`RouterConfig::validate`]
    #[must_use]
    pub fn from_routers(mut routers: Vec<RouterConfig>) -> Self {
        routers.retain(|router| match router.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Invalid router configuration: {}", e);
                tracing::warn!("Skipping invalid router: {}", router.name);
                false
            }
        });
        Config { routers }
    }

    /// Parses a JSON array of router entries
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed JSON.
    pub fn parse_routers(json: &str) -> Result<Vec<RouterConfig>> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Builds the single-router fallback from `ROUTEROS_*` variables
    fn router_from_vars(var: impl Fn(&str) -> Option<String>) -> Option<RouterConfig> {
        let address = var(env_vars::ROUTEROS_ADDRESS)?;
        let username = var(env_vars::ROUTEROS_USERNAME)
            .unwrap_or_else(|| defaults::ROUTEROS_USERNAME.to_string());
        let password = var(env_vars::ROUTEROS_PASSWORD)
            .unwrap_or_else(|| defaults::ROUTEROS_PASSWORD.to_string());
        let login = match var(env_vars::ROUTEROS_LOGIN).as_deref() {
            Some("plain") => LoginMethod::Plain,
            Some("auto") => LoginMethod::Auto,
            Some("challenge") | None => LoginMethod::Challenge,
            Some(other) => {
                tracing::warn!("Unknown login method '{}', using challenge", other);
                LoginMethod::Challenge
            }
        };
        let secs = |key: &str, default: u64| {
            Some(
                var(key)
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(default),
            )
        };

        Some(RouterConfig {
            name: "default".to_string(),
            address,
            username,
            password,
            login,
            connect_timeout_secs: secs(
                env_vars::ROUTEROS_CONNECT_TIMEOUT,
                defaults::CONNECT_TIMEOUT_SECS,
            ),
            read_timeout_secs: secs(env_vars::ROUTEROS_READ_TIMEOUT, defaults::READ_TIMEOUT_SECS),
        })
    }
}
