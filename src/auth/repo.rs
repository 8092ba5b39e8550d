use std::collections::HashMap;

use axum::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password;
use crate::error::AuthError;

/// User record. `password_hash` is `None` for OAuth-originated accounts.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    fn new(email: &str, password_hash: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            password_hash,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Storage capability for user records, injected so a real backing store can be
/// substituted without touching the handlers.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Insert a new user. Fails with `AlreadyExists` if the email is taken; the
    /// check and the insert must be atomic.
    async fn create(&self, email: &str, password_hash: Option<String>) -> Result<User, AuthError>;

    /// Return the user for an OAuth sign-in, inserting a passwordless record if
    /// the email is unknown. An existing record is returned untouched.
    async fn upsert_oauth(&self, email: &str) -> Result<User, AuthError>;
}

/// Process-local user store keyed by email. Stands in for a database; nothing
/// survives a restart.
#[derive(Default)]
pub struct InMemoryUsers {
    users: RwLock<HashMap<String, User>>,
}

#[async_trait]
impl UserRepo for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn create(&self, email: &str, password_hash: Option<String>) -> Result<User, AuthError> {
        // Single write lock covers the lookup and the insert, so two concurrent
        // registrations for one email cannot both succeed.
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(AuthError::AlreadyExists);
        }
        let user = User::new(email, password_hash);
        users.insert(email.to_owned(), user.clone());
        debug!(user_id = %user.id, "user inserted");
        Ok(user)
    }

    async fn upsert_oauth(&self, email: &str) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(email) {
            return Ok(existing.clone());
        }
        let user = User::new(email, None);
        users.insert(email.to_owned(), user.clone());
        info!(user_id = %user.id, "oauth user created");
        Ok(user)
    }
}

/// Hash the password and insert the user.
pub async fn create_user(
    repo: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let hash = password::hash_password(password).await?;
    repo.create(email, Some(hash)).await
}

/// Check a credential pair against the store. Unknown email, a record without a
/// password hash and a failed comparison all produce the same error.
pub async fn verify_user(
    repo: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let user = repo
        .find_by_email(email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(AuthError::InvalidCredentials);
    };
    if !password::verify_password(password, hash).await? {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let repo = InMemoryUsers::default();
        repo.create("a@b.com", Some("hash".into()))
            .await
            .expect("first insert");
        let err = repo
            .create("a@b.com", Some("other".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));
    }

    #[tokio::test]
    async fn concurrent_registration_admits_exactly_one() {
        let repo = std::sync::Arc::new(InMemoryUsers::default());
        let a = tokio::spawn({
            let repo = repo.clone();
            async move { repo.create("race@b.com", Some("h1".into())).await }
        });
        let b = tokio::spawn({
            let repo = repo.clone();
            async move { repo.create("race@b.com", Some("h2".into())).await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a.is_ok() ^ b.is_ok());
    }

    #[tokio::test]
    async fn find_by_id_returns_created_user() {
        let repo = InMemoryUsers::default();
        let user = repo.create("a@b.com", None).await.expect("insert");
        let found = repo.find_by_id(user.id).await.expect("lookup");
        assert_eq!(found.expect("present").email, "a@b.com");
    }

    #[tokio::test]
    async fn upsert_oauth_reuses_existing_record() {
        let repo = InMemoryUsers::default();
        let created = repo
            .create("a@b.com", Some("hash".into()))
            .await
            .expect("insert");
        let upserted = repo.upsert_oauth("a@b.com").await.expect("upsert");
        assert_eq!(upserted.id, created.id);
        // The password hash survives an OAuth sign-in for the same email.
        assert!(upserted.password_hash.is_some());
    }

    #[tokio::test]
    async fn verify_user_succeeds_with_matching_password() {
        let repo = InMemoryUsers::default();
        create_user(&repo, "a@b.com", "longenough")
            .await
            .expect("register");
        let user = verify_user(&repo, "a@b.com", "longenough")
            .await
            .expect("verify");
        assert_eq!(user.email, "a@b.com");
    }

    #[tokio::test]
    async fn verify_user_rejects_unknown_email() {
        let repo = InMemoryUsers::default();
        let err = verify_user(&repo, "nobody@b.com", "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_user_rejects_wrong_password() {
        let repo = InMemoryUsers::default();
        create_user(&repo, "a@b.com", "longenough")
            .await
            .expect("register");
        let err = verify_user(&repo, "a@b.com", "not-the-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn verify_user_rejects_oauth_only_account() {
        let repo = InMemoryUsers::default();
        repo.upsert_oauth("oauth@b.com").await.expect("upsert");
        let err = verify_user(&repo, "oauth@b.com", "anything")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
