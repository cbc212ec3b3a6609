use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use secrecy::ExposeSecret;
use strum_macros::AsRefStr;
use tracing::{error, info, warn, Span};

use crate::{
    app::AppState,
    contacts_client::{self, CreateContactOutcome},
    web::{
        types::{DataParsingError, SubscribeRequest, SubscriptionResult, ValidEmail},
        ClientError, WebResult,
    },
};

/// Used when the upstream rejects a contact without telling us why.
pub const UPSTREAM_FALLBACK_MESSAGE: &str = "Failed to subscribe. Please try again.";

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum SubscribeError {
    #[error("the request body could not be read as json: {0}")]
    InvalidBody(String),
    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),

    #[error("the contacts API key is not configured")]
    MissingApiKey,

    #[error("upstream rejected the contact with status {status}: {message:?}")]
    UpstreamRejected {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("contacts client error: {0}")]
    ContactsClient(#[from] contacts_client::Error),
}

impl SubscribeError {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use SubscribeError::*;

        match self {
            InvalidBody(_) | DataParsing(_) => (StatusCode::BAD_REQUEST, ClientError::InvalidEmail),
            MissingApiKey => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ClientError::ServiceMisconfigured,
            ),
            UpstreamRejected { status, message } => (
                *status,
                ClientError::Upstream(
                    message
                        .clone()
                        .unwrap_or_else(|| UPSTREAM_FALLBACK_MESSAGE.to_string()),
                ),
            ),
            ContactsClient(contacts_client::Error::ContactIdMissing) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ClientError::ContactIdMissing,
            ),
            ContactsClient(_) => (StatusCode::INTERNAL_SERVER_ERROR, ClientError::ServiceError),
        }
    }
}

// ###################################
// ->   API
// ###################################
/// Registers the email as a tagged contact with the upstream.
///
/// A contact that already exists is reported as a success.
#[tracing::instrument(
    name = "Registering a new subscriber",
    skip_all,
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    State(app_state): State<AppState>,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> WebResult<Json<SubscriptionResult>> {
    let Json(payload) = payload.map_err(|rej| SubscribeError::InvalidBody(rej.body_text()))?;
    let email = ValidEmail::parse(payload.email.unwrap_or_default())
        .map_err(SubscribeError::DataParsing)?;
    Span::current().record("subscriber_email", email.as_ref());

    let api_key = app_state
        .contacts_api_key
        .as_ref()
        .filter(|key| !key.expose_secret().trim().is_empty());
    let Some(api_key) = api_key else {
        error!(
            "{} not configured - refusing to contact the upstream",
            crate::config::API_KEY_ENV
        );
        return Err(SubscribeError::MissingApiKey.into());
    };

    let outcome = app_state
        .contacts_client
        .create_contact(api_key, &email)
        .await
        .map_err(SubscribeError::ContactsClient)?;

    match outcome {
        CreateContactOutcome::Created(created) => {
            info!(
                contact_id = %created.id,
                language = created.contact.language.as_deref(),
                tags = created.contact.tag_ids.len(),
                "contact created"
            );
            Ok(Json(SubscriptionResult::subscribed()))
        }
        CreateContactOutcome::AlreadyExists => {
            info!("contact already exists");
            Ok(Json(SubscriptionResult::already_subscribed()))
        }
        CreateContactOutcome::Rejected { status, message } => {
            warn!(%status, upstream_message = message.as_deref(), "upstream rejected the contact");
            Err(SubscribeError::UpstreamRejected { status, message }.into())
        }
    }
}
