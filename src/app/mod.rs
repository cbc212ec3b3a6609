use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing::info;

use crate::{config::AppConfig, ContactsClient, Result};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let contacts_config = config.contacts_config;
        let contacts_client = ContactsClient::new(
            &contacts_config.url,
            contacts_config.language.as_str(),
            contacts_config.tag_id,
            contacts_config.timeout(),
        )?;

        let app_state = AppState::new(contacts_client, contacts_config.api_key);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

pub struct InternalState {
    pub contacts_client: ContactsClient,
    /// Read on every subscription, `None` means the deployment is missing the key.
    pub contacts_api_key: Option<SecretString>,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(contacts_client: ContactsClient, contacts_api_key: Option<SecretString>) -> Self {
        AppState(Arc::new(InternalState {
            contacts_client,
            contacts_api_key,
        }))
    }
}
