use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Field-level validation detail, keyed by the offending input field.
#[derive(Debug, Default, Serialize)]
pub struct FieldErrors(pub BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("Email already registered")]
    AlreadyExists,
    // One message for unknown email, missing hash and wrong password,
    // so responses cannot be used to enumerate accounts.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Google sign-in is not configured")]
    OauthUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": fields }),
            ),
            AuthError::AlreadyExists => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string() }),
            ),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": self.to_string() }),
            ),
            AuthError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": self.to_string() }),
            ),
            AuthError::OauthUnavailable => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string() }),
            ),
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_response_carries_field_detail() {
        let mut fields = FieldErrors::default();
        fields.push("password", "Password must be at least 8 characters");
        let response = AuthError::Validation(fields).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn credential_errors_share_one_message() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn internal_errors_map_to_500() {
        let response = AuthError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
