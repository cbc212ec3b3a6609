//! The configuration structs used to build the AppConfig, and their impls.
use std::{path::Path, time::Duration};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult, API_KEY_ENV, LEGACY_API_KEY_ENV};

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub contacts_config: ContactsConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
}

/// Everything needed to talk to the upstream contacts API.
#[derive(Deserialize, Clone, Debug)]
pub struct ContactsConfig {
    pub url: String,
    /// Missing key is not a config error, the subscribe route reports it per request.
    /// A blank key is dropped on load.
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub language: String,
    pub tag_id: u64,
    pub timeout_millis: u64,
}

// ###################################
// ->   IMPLs
// ###################################
impl ContactsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

impl AppConfig {
    /// Loads the config from `./config` relative to the current working directory.
    pub fn load(environment: &Environment) -> ConfigResult<Self> {
        let config_dir = std::env::current_dir()?.join("config");
        Self::load_from(&config_dir, environment)
    }

    /// Merges, in order of increasing priority:
    /// `base.toml`, `{environment}.toml`, `APP_*` env variables (`__` separates nested keys),
    /// the legacy API key env variable and finally the API key env variable.
    pub fn load_from(config_dir: &Path, environment: &Environment) -> ConfigResult<Self> {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut config: AppConfig = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"))
            .merge(api_key_env(LEGACY_API_KEY_ENV))
            .merge(api_key_env(API_KEY_ENV))
            .extract()?;

        config.contacts_config.api_key = config
            .contacts_config
            .api_key
            .filter(|key| !key.expose_secret().trim().is_empty());

        Ok(config)
    }
}

/// Reads a single env variable into `contacts_config.api_key`.
fn api_key_env(name: &'static str) -> Env {
    Env::raw()
        .only(&[name])
        .map(|_| "contacts_config.api_key".into())
}

// ###################################
// ->   TRY FROMs
// ###################################
impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail(value)),
        }
    }
}
