use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

/// Google OAuth client credentials. Absent when the variant is not configured.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub google: Option<GoogleConfig>,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_days: std::env::var("TOKEN_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };

        // Google sign-in is optional; both halves of the credential must be set.
        let google = match (
            std::env::var("GOOGLE_CLIENT_ID"),
            std::env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: std::env::var("GOOGLE_REDIRECT_URL")
                    .unwrap_or_else(|_| "http://localhost:8080/api/auth/google/callback".into()),
            }),
            _ => None,
        };

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            jwt,
            google,
            cookie_secure,
        })
    }
}
