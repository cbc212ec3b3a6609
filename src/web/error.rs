use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::routes::SubscribeError;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),

    #[error("subscribe error: {0}")]
    Subscribe(#[from] SubscribeError),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        match self {
            Error::MethodNotAllowed(_) => {
                (StatusCode::METHOD_NOT_ALLOWED, ClientError::MethodNotAllowed)
            }
            Error::Subscribe(sub_er) => sub_er.status_code_and_client_error(),
        }
    }

    /// The variant name of the wrapped route error, used in the request log line.
    pub fn inner_variant(&self) -> &str {
        match self {
            Error::MethodNotAllowed(_) => self.as_ref(),
            Error::Subscribe(sub_er) => sub_er.as_ref(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The errors a client gets to see. The `Display` output is the `error` field of the body.
#[derive(Debug, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("Method not allowed")]
    MethodNotAllowed,
    #[display("Valid email is required")]
    InvalidEmail,
    #[display("Server configuration error")]
    ServiceMisconfigured,
    #[display("Contact created but ID missing")]
    ContactIdMissing,
    #[display("{_0}")]
    Upstream(String),
    #[display("An unexpected error occurred. Please try again.")]
    ServiceError,
}
