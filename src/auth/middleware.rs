//! Session middleware.
//!
//! Runs on every request: reads the session cookie, validates it against the
//! store and stashes the outcome in request extensions for extractors to
//! pick up. The middleware itself never rejects; handlers that require a
//! user do so through [`crate::api::models::users::CurrentUser`].
//!
//! On the way out it re-issues the cookie when the session was renewed, and
//! clears it when the presented token turned out to be dead.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session::{self, ValidatedSession},
    db::{errors::DbError, handlers::repository::Repository, handlers::users::Users},
    errors::Result,
};
use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, trace};

/// The authenticated session attached to a request.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user: CurrentUser,
    /// The raw session token, needed to invalidate on sign-out.
    pub token: String,
    /// True when this request triggered a renewal and the cookie must be
    /// re-issued.
    pub renewed: bool,
}

/// Validate the session cookie, if any, against the store.
///
/// `Ok(None)` covers both "no cookie" and "dead session"; the boolean in the
/// tuple distinguishes them so the caller can clear a stale cookie.
async fn authenticate(state: &AppState, request: &mut Request) -> Result<(bool, Option<SessionContext>)> {
    let token = request
        .headers()
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| session::cookie_value(h, &state.config.auth.session.cookie_name))
        .map(str::to_owned);

    let Some(token) = token else {
        trace!("no session cookie presented");
        return Ok((false, None));
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let Some(ValidatedSession { record, renewed }) =
        session::validate_session(&mut conn, &state.config.auth.session, &token).await?
    else {
        debug!("session cookie is dead or unknown");
        return Ok((true, None));
    };

    let Some(user) = Users::new(&mut conn).get_by_id(record.user_id).await? else {
        // The user row vanished under a live session; drop the session too.
        session::invalidate_session(&mut conn, &token).await?;
        return Ok((true, None));
    };

    Ok((
        true,
        Some(SessionContext {
            user: CurrentUser {
                id: user.id,
                email: user.email,
                display_name: user.display_name,
                avatar_url: user.avatar_url,
            },
            token,
            renewed,
        }),
    ))
}

pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response> {
    let (had_cookie, context) = authenticate(&state, &mut request).await?;

    if let Some(context) = &context {
        request.extensions_mut().insert(context.clone());
    }

    let mut response = next.run(request).await;

    let session_config = &state.config.auth.session;
    // A handler that already set the session cookie (sign-out) wins.
    let handler_set_cookie = response.headers().get_all(header::SET_COOKIE).iter().any(|v| {
        v.to_str()
            .is_ok_and(|v| v.starts_with(&format!("{}=", session_config.cookie_name)))
    });

    if !handler_set_cookie {
        let cookie = match context {
            Some(context) if context.renewed => Some(session::session_cookie(session_config, &context.token)),
            None if had_cookie => Some(session::clear_session_cookie(session_config)),
            _ => None,
        };
        if let Some(cookie) = cookie
            && let Ok(value) = HeaderValue::from_str(&cookie)
        {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    Ok(response)
}
