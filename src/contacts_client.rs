use std::fmt;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::web::types::ValidEmail;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Substrings the upstream uses in its messages when the email is already a contact.
const DUPLICATE_MARKERS: [&str; 2] = ["already exists", "already used"];

// ###################################
// ->   STRUCTS
// ###################################
/// Client for the upstream contact-management API.
///
/// Holds the fixed language and tag that every new contact gets created with,
/// so a contact is never left untagged.
#[derive(Debug)]
pub struct ContactsClient {
    pub http_client: Client,
    pub url: reqwest::Url,
    pub language: String,
    pub tag_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactBody<'a> {
    pub email: &'a str,
    pub language: &'a str,
    pub tag_ids: [u64; 1],
}

/// Identifiers coming from the upstream can be numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalId {
    Number(serde_json::Number),
    Text(String),
}

/// The contact record as returned by the upstream on creation.
///
/// Read field by field from the json value, a field with an unexpected shape
/// is left empty instead of failing a creation that already happened.
#[derive(Debug, Clone, Default)]
pub struct ExternalContact {
    pub id: Option<ExternalId>,
    pub email: Option<String>,
    pub language: Option<String>,
    pub tag_ids: Vec<ExternalId>,
}

/// Error payload of the upstream, both fields are optional and either might carry the reason.
#[derive(Deserialize, Debug, Default)]
pub struct UpstreamErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug)]
pub enum CreateContactOutcome {
    Created(CreatedContact),
    /// The upstream refused the contact because it already exists.
    AlreadyExists,
    /// Any other non-success response.
    Rejected {
        status: StatusCode,
        message: Option<String>,
    },
}

#[derive(Debug)]
pub struct CreatedContact {
    pub id: ExternalId,
    pub contact: ExternalContact,
}

// ###################################
// ->   IMPLs
// ###################################
impl ContactsClient {
    pub fn new<S: AsRef<str>>(
        url: S,
        language: impl Into<String>,
        tag_id: u64,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let url =
            reqwest::Url::parse(url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(ContactsClient {
            http_client,
            url,
            language: language.into(),
            tag_id,
        })
    }

    /// Creates the contact and applies the tag in a single request.
    #[tracing::instrument(name = "create_contact", skip_all)]
    pub async fn create_contact(
        &self,
        api_key: &SecretString,
        email: &ValidEmail,
    ) -> Result<CreateContactOutcome> {
        let url = self
            .url
            .join("api/contacts")
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        let body = CreateContactBody {
            email: email.as_ref(),
            language: &self.language,
            tag_ids: [self.tag_id],
        };

        let resp = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;

        if status.is_success() {
            let value: Value = serde_json::from_slice(&bytes)?;
            let contact = ExternalContact::from_json(&value);
            let id = contact.id.clone().ok_or(Error::ContactIdMissing)?;

            return Ok(CreateContactOutcome::Created(CreatedContact { id, contact }));
        }

        // Error bodies are best effort, a 409 with an empty or HTML body is still a duplicate.
        let error_body: UpstreamErrorBody = serde_json::from_slice(&bytes).unwrap_or_else(|er| {
            debug!("upstream error body is not valid json: {er}");
            UpstreamErrorBody::default()
        });

        if is_duplicate(status, &error_body) {
            return Ok(CreateContactOutcome::AlreadyExists);
        }

        Ok(CreateContactOutcome::Rejected {
            status,
            message: error_body.into_message(),
        })
    }
}

impl ExternalId {
    /// Any number or non-blank string, everything else counts as no id.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(ExternalId::Number(n.clone())),
            Value::String(text) if !text.trim().is_empty() => Some(ExternalId::Text(text.clone())),
            _ => None,
        }
    }
}

impl ExternalContact {
    pub fn from_json(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(ToOwned::to_owned);

        ExternalContact {
            id: value.get("id").and_then(ExternalId::from_json),
            email: text("email"),
            language: text("language"),
            tag_ids: value
                .get("tagIds")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(ExternalId::from_json).collect())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalId::Number(n) => write!(f, "{n}"),
            ExternalId::Text(s) => write!(f, "{s}"),
        }
    }
}

impl UpstreamErrorBody {
    fn texts(&self) -> impl Iterator<Item = &str> {
        [self.message.as_deref(), self.detail.as_deref()]
            .into_iter()
            .flatten()
    }

    /// The first non-empty of `message` and `detail`.
    pub fn into_message(self) -> Option<String> {
        [self.message, self.detail]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
    }
}

/// Whether the upstream response means the contact is already registered.
pub fn is_duplicate(status: StatusCode, body: &UpstreamErrorBody) -> bool {
    if matches!(
        status,
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
    ) {
        return true;
    }

    body.texts().any(|text| {
        let text = text.to_lowercase();
        DUPLICATE_MARKERS.iter().any(|marker| text.contains(marker))
    })
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[error("contact created but the response carries no id")]
    ContactIdMissing,

    #[error("failed to deserialize the upstream response: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
