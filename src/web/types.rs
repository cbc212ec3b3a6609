//! Request and response bodies of the `web` module, with the parsing rules for the inbound data.

use serde::{Deserialize, Serialize};

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable subscription request.
/// Every field is optional here so that a missing email is reported as invalid input.
#[derive(Debug, Default, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Validated subscriber email.
#[derive(Debug, Clone)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl ValidEmail {
    /// The only requirement is an `@` somewhere in the address,
    /// the upstream does the real validation.
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        if value.is_empty() {
            return Err(DataParsingError::EmailMissing);
        }

        if value.contains('@') {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid)
        }
    }
}

/// Body of every successful subscription response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionResult {
    pub success: bool,
    pub message: String,
}

impl SubscriptionResult {
    pub const SUBSCRIBED: &'static str = "Successfully subscribed!";
    pub const ALREADY_SUBSCRIBED: &'static str = "You are already subscribed!";

    pub fn subscribed() -> Self {
        Self {
            success: true,
            message: Self::SUBSCRIBED.to_string(),
        }
    }

    pub fn already_subscribed() -> Self {
        Self {
            success: true,
            message: Self::ALREADY_SUBSCRIBED.to_string(),
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("email missing")]
    EmailMissing,
    #[error("email invalid")]
    EmailInvalid,
}
