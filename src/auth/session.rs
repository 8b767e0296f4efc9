//! Opaque server-side sessions with a two-tier expiry.
//!
//! Every session carries two windows. While `now < active_expires` the
//! session is honored as-is. Between `active_expires` and `idle_expires` the
//! next presentation renews both windows in a single guarded UPDATE, so
//! concurrent requests cannot double-extend or resurrect a dead session.
//! Past `idle_expires` the row is deleted lazily on the next lookup.

use crate::config::SessionConfig;
use crate::db::handlers::sessions::Sessions;
use crate::db::models::sessions::SessionRecord;
use crate::errors::Result;
use crate::types::{UnixMillis, UserId, abbrev_token};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use super::password::generate_session_token;

/// Where a session record sits relative to its two expiry windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Inside the active window; no renewal needed.
    Active,
    /// Active window elapsed, idle window not yet; renew on presentation.
    IdleRenewable,
    /// Both windows elapsed; the record is dead.
    Expired,
}

/// Classify a record against a point in time.
pub fn classify(record: &SessionRecord, now: UnixMillis) -> SessionState {
    if now < record.active_expires {
        SessionState::Active
    } else if now < record.idle_expires {
        SessionState::IdleRenewable
    } else {
        SessionState::Expired
    }
}

/// Outcome of presenting a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    pub record: SessionRecord,
    /// True when this presentation renewed the expiry windows; the caller
    /// should re-issue the cookie with the new lifetime.
    pub renewed: bool,
}

fn window_millis(config: &SessionConfig) -> (UnixMillis, UnixMillis) {
    (
        config.active_period.as_millis() as UnixMillis,
        config.idle_period.as_millis() as UnixMillis,
    )
}

/// Create a session for a user: a fresh 256-bit token with both windows
/// starting now.
#[instrument(skip_all, err)]
pub async fn create_session(
    db: &mut SqliteConnection,
    config: &SessionConfig,
    user_id: UserId,
) -> Result<SessionRecord> {
    let (active, idle) = window_millis(config);
    let now = Utc::now().timestamp_millis();
    let token = generate_session_token();

    let record = Sessions::new(db).create(&token, user_id, now + active, now + active + idle).await?;
    Ok(record)
}

/// Validate a presented token against the clock.
///
/// Returns `None` for unknown or fully expired tokens; expired rows are
/// deleted on the way out. Idle sessions are renewed atomically, and a
/// renewal that loses the race to full expiry is reported as `None` too.
#[instrument(skip_all, fields(session = %abbrev_token(token)), err)]
pub async fn validate_session(
    db: &mut SqliteConnection,
    config: &SessionConfig,
    token: &str,
) -> Result<Option<ValidatedSession>> {
    validate_session_at(db, config, token, Utc::now().timestamp_millis()).await
}

async fn validate_session_at(
    db: &mut SqliteConnection,
    config: &SessionConfig,
    token: &str,
    now: UnixMillis,
) -> Result<Option<ValidatedSession>> {
    let mut sessions = Sessions::new(db);
    let Some(record) = sessions.get(token).await? else {
        return Ok(None);
    };

    match classify(&record, now) {
        SessionState::Active => Ok(Some(ValidatedSession { record, renewed: false })),
        SessionState::IdleRenewable => {
            let (active, idle) = window_millis(config);
            match sessions.renew(token, now, now + active, now + active + idle).await? {
                Some(record) => Ok(Some(ValidatedSession { record, renewed: true })),
                // Another request saw it fully expired first.
                None => Ok(None),
            }
        }
        SessionState::Expired => {
            sessions.delete(token).await?;
            Ok(None)
        }
    }
}

/// Invalidate a session. Safe to call for tokens that no longer exist.
#[instrument(skip_all, fields(session = %abbrev_token(token)), err)]
pub async fn invalidate_session(db: &mut SqliteConnection, token: &str) -> Result<()> {
    Sessions::new(db).delete(token).await?;
    Ok(())
}

/// Serialize the session cookie for a live session.
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    let max_age = config.active_period.as_secs() + config.idle_period.as_secs();
    format_cookie(config, token, max_age as i64)
}

/// Serialize an expired session cookie so the browser drops it.
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    format_cookie(config, "", 0)
}

fn format_cookie(config: &SessionConfig, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={value}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
        config.cookie_name, config.cookie_same_site
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Pull a cookie value out of a `Cookie` request header.
pub fn cookie_value<'h>(header: &'h str, name: &str) -> Option<&'h str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}
