use std::time::Duration;

use tracing::error;

use crate::error::AuthError;

/// Fixed bcrypt work factor. Expensive on purpose; hashing runs on the blocking
/// pool so request workers are not stalled.
const BCRYPT_COST: u32 = 12;

/// Upper bound on a single hash or verify, so abuse cannot pin blocking threads.
const HASH_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn hash_password(plain: &str) -> Result<String, AuthError> {
    let plain = plain.to_owned();
    run_blocking(move || bcrypt::hash(plain, BCRYPT_COST)).await
}

pub async fn verify_password(plain: &str, hash: &str) -> Result<bool, AuthError> {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    run_blocking(move || bcrypt::verify(plain, &hash)).await
}

async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
{
    let result = tokio::time::timeout(HASH_TIMEOUT, tokio::task::spawn_blocking(f))
        .await
        .map_err(|_| {
            error!("bcrypt exceeded {:?}", HASH_TIMEOUT);
            AuthError::Internal(anyhow::anyhow!("password hashing timed out"))
        })?
        .map_err(|e| AuthError::Internal(e.into()))?;
    result.map_err(|e| {
        error!(error = %e, "bcrypt error");
        AuthError::Internal(e.into())
    })
}
