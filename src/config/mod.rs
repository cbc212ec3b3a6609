//! Builds an `AppConfig` from the TOML files in the `config` directory and the environment.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::sync::OnceLock;
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{AppConfig, ContactsConfig, Environment, NetConfig};

/// Name of the environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "CONTACTS_API_KEY";
/// Name the key was deployed under before, still read when `API_KEY_ENV` is unset.
pub const LEGACY_API_KEY_ENV: &str = "SYSTEME_API_KEY";

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<12} - Initializing the configuration",
            "get_or_init_config"
        );

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .unwrap_or_else(|er| panic!("Fatal Error: Parsing APP_ENVIRONMENT: {er}"));

        let config = AppConfig::load(&environment)
            .unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"));

        if config.contacts_config.api_key.is_none() {
            tracing::warn!(
                "neither {API_KEY_ENV} nor {LEGACY_API_KEY_ENV} is set - subscription requests will fail until it is configured"
            );
        }

        config
    })
}
