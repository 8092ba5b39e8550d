use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::{AuthError, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_register(email: &str, password: &str) -> Result<(), AuthError> {
    let mut fields = FieldErrors::default();
    if !is_valid_email(email) {
        fields.push("email", "Invalid email");
    }
    if password.len() < MIN_PASSWORD_LEN {
        fields.push(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(fields))
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    let mut fields = FieldErrors::default();
    if !is_valid_email(email) {
        fields.push("email", "Invalid email");
    }
    if password.is_empty() {
        fields.push("password", "Password is required");
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn register_validation_reports_both_fields() {
        let err = validate_register("bogus", "short").unwrap_err();
        let AuthError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.0.contains_key("email"));
        assert!(fields.0.contains_key("password"));
    }

    #[test]
    fn register_validation_passes_good_input() {
        assert!(validate_register("a@b.com", "longenough").is_ok());
    }

    #[test]
    fn public_user_hides_password_hash() {
        let response = PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }
}
