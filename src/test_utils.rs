//! Shared helpers for tests.

use crate::{AppState, config::Config};
use sqlx::SqlitePool;

/// A config suitable for tests: fixed secret, non-secure cookies.
pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key-test-secret-key-32".to_string()),
        ..Default::default()
    };
    config.auth.session.cookie_secure = false;
    config
}

pub async fn create_test_app_state(pool: SqlitePool) -> AppState {
    AppState::builder().db(pool).config(create_test_config()).build()
}
