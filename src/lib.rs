pub mod app;
pub mod config;
pub mod contacts_client;
mod error;
pub mod web;

pub use app::{App, AppState};
pub use contacts_client::ContactsClient;
pub use error::{Error, Result};
pub use web::serve;

use tracing_subscriber::EnvFilter;

/// Human readable logs for local development, `RUST_LOG` overrides the default `debug` filter.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .compact()
        .init();
}

pub fn init_production_tracing() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
