use std::sync::Arc;

use crate::auth::repo::{InMemoryUsers, UserRepo};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let users = Arc::new(InMemoryUsers::default()) as Arc<dyn UserRepo>;
        Ok(Self { users, config })
    }

    pub fn from_parts(users: Arc<dyn UserRepo>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// State with a fresh store and a fixed secret, for tests.
    pub fn fake() -> Self {
        use crate::config::JwtConfig;

        let config = Arc::new(AppConfig {
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_days: 7,
            },
            google: None,
            cookie_secure: false,
        });
        let users = Arc::new(InMemoryUsers::default()) as Arc<dyn UserRepo>;
        Self { users, config }
    }
}
