use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, error::AuthError, state::AppState};

/// Session token payload. Only the subject and the time bounds are carried;
/// verification checks nothing beyond signature and expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_days } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_days as u64) * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, user_id: Uuid) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(e.into()))?;
        debug!(user_id = %user_id, "session token signed");
        Ok(token)
    }

    /// Bad signature, malformed structure and expiry all collapse into
    /// `InvalidToken`; callers treat them as an absent session.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        // Expired well past the default validation leeway.
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let keys = make_keys();
        let token = keys.sign(Uuid::new_v4()).expect("sign");
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"some-other-secret"),
            decoding: DecodingKey::from_secret(b"some-other-secret"),
            ttl: keys.ttl,
        };
        assert!(matches!(
            other.verify(&token).unwrap_err(),
            AuthError::InvalidToken
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(matches!(
            keys.verify("not.a.jwt").unwrap_err(),
            AuthError::InvalidToken
        ));
    }
}
