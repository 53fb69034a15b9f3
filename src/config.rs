// src/config.rs
//! Service configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional `healthpass.toml` in the working directory
//! 3. Environment variables prefixed `HEALTHPASS_` (a `.env` file is loaded first)

use crate::utils::clock::SystemClock;
use anyhow::{bail, Context};
use config::{Config, ConfigBuilder, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "healthpass";
const ENV_PREFIX: &str = "HEALTHPASS";
const DEVELOPMENT_JWT_SECRET: &str = "healthpass-development-secret";

/// Time zone deciding which calendar day "today" is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZone {
    /// Fixed `utc_offset_minutes` from UTC
    Fixed,
    /// The host's local zone, including daylight saving
    Local,
}

/// Deployment environment, selecting the base URL of signed program URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Deployment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Deployment,
    pub production_ui_url: String,
    pub development_ui_url: String,
    pub listen_addr: String,
    pub time_zone: TimeZone,
    /// Offset from UTC used when `time_zone` is `fixed`
    pub utc_offset_minutes: i32,
    pub jwt_secret: Option<String>,
    pub seed_demo_account: Option<bool>,
}

impl Settings {
    /// Loads settings from defaults, `healthpass.toml` and the environment.
    pub fn load() -> anyhow::Result<Self> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX));
        Self::build(builder)
    }

    fn defaults() -> anyhow::Result<ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("environment", "development")?
            .set_default("production_ui_url", "http://healthpassport.vitorpamplona.com")?
            .set_default("development_ui_url", "http://localhost:3001")?
            .set_default("listen_addr", "127.0.0.1:3000")?
            .set_default("time_zone", "fixed")?
            .set_default("utc_offset_minutes", 0i64)?)
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> anyhow::Result<Self> {
        builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Prefix of public program URLs for the current deployment.
    pub fn base_url(&self) -> &str {
        match self.environment {
            Deployment::Production => &self.production_ui_url,
            Deployment::Development => &self.development_ui_url,
        }
    }

    pub fn clock(&self) -> anyhow::Result<SystemClock> {
        match self.time_zone {
            TimeZone::Local => Ok(SystemClock::Local),
            TimeZone::Fixed => SystemClock::with_offset_minutes(self.utc_offset_minutes)
                .with_context(|| {
                    format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
                }),
        }
    }

    /// Session signing secret. Production refuses to start without one.
    pub fn jwt_secret(&self) -> anyhow::Result<String> {
        match (&self.jwt_secret, self.environment) {
            (Some(secret), _) if !secret.is_empty() => Ok(secret.clone()),
            (_, Deployment::Production) => bail!("jwt_secret must be set in production"),
            (_, Deployment::Development) => Ok(DEVELOPMENT_JWT_SECRET.to_string()),
        }
    }

    pub fn seed_demo_account(&self) -> bool {
        self.seed_demo_account
            .unwrap_or(self.environment == Deployment::Development)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        let builder = Settings::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml));
        Settings::build(builder).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = from_toml("");
        assert_eq!(settings.environment, Deployment::Development);
        assert_eq!(settings.base_url(), "http://localhost:3001");
        assert_eq!(settings.listen_addr, "127.0.0.1:3000");
        assert!(settings.seed_demo_account());
        assert_eq!(settings.jwt_secret().unwrap(), DEVELOPMENT_JWT_SECRET);
    }

    #[test]
    fn test_production_selects_public_url() {
        let settings = from_toml(
            r#"
            environment = "production"
            jwt_secret = "s3cret"
            "#,
        );
        assert_eq!(settings.base_url(), "http://healthpassport.vitorpamplona.com");
        assert!(!settings.seed_demo_account());
        assert_eq!(settings.jwt_secret().unwrap(), "s3cret");
    }

    #[test]
    fn test_production_requires_secret() {
        let settings = from_toml(r#"environment = "production""#);
        assert!(settings.jwt_secret().is_err());
    }

    #[test]
    fn test_invalid_offset() {
        let settings = from_toml("utc_offset_minutes = 100000");
        assert!(settings.clock().is_err());
        assert!(from_toml("utc_offset_minutes = -300").clock().is_ok());
    }

    #[test]
    fn test_local_time_zone() {
        let settings = from_toml(r#"time_zone = "local""#);
        assert_eq!(settings.time_zone, TimeZone::Local);
        assert!(matches!(settings.clock().unwrap(), SystemClock::Local));
        assert!(matches!(
            from_toml("").clock().unwrap(),
            SystemClock::Fixed(_)
        ));
    }
}
