//! Service configuration

use anyhow::{Result, bail};
use serde::Deserialize;
use std::time::Duration;

/// Access service settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,
    /// Timeout applied to each access record fetch, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Where unauthenticated visitors are sent
    pub sign_in_path: String,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl AccessConfig {
    /// Load settings from defaults overlaid with the environment
    ///
    /// # Environment Variables
    /// - `ACCESS_BIND_ADDR` (default: "0.0.0.0:3000")
    /// - `ACCESS_FETCH_TIMEOUT_MS` (default: 5000)
    /// - `ACCESS_SIGN_IN_PATH` (default: "/signin")
    /// - `ACCESS_LOG_LEVEL` (default: "info")
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let settings = ::config::Config::builder()
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("fetch_timeout_ms", defaults.fetch_timeout_ms)?
            .set_default("sign_in_path", defaults.sign_in_path)?
            .set_default("log_level", defaults.log_level)?
            .add_source(::config::Environment::with_prefix("ACCESS").try_parsing(true))
            .build()?;

        let config: AccessConfig = settings.try_deserialize()?;

        if config.fetch_timeout_ms == 0 {
            bail!("ACCESS_FETCH_TIMEOUT_MS must be greater than zero");
        }

        if !config.sign_in_path.starts_with('/') {
            bail!(
                "ACCESS_SIGN_IN_PATH must be an absolute path, got {}",
                config.sign_in_path
            );
        }

        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            fetch_timeout_ms: 5000,
            sign_in_path: "/signin".to_string(),
            log_level: "info".to_string(),
        }
    }
}
