//! Anti-forgery protection via a signed double-submit token.
//!
//! The server hands out a random token twice: in the response body (for the
//! client to echo back in a header) and in an HttpOnly cookie as
//! `token.signature`, signed with the server secret. A mutating request is
//! accepted only when the cookie signature verifies and the header token
//! matches the cookie token.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::prelude::RngExt;
use rand::rng;
use sha2::Sha256;

use crate::AppState;
use crate::config::CsrfConfig;
use crate::errors::{Error, Result};

use super::session::cookie_value;

type HmacSha256 = Hmac<Sha256>;

/// A freshly issued anti-forgery token and its signed cookie payload.
#[derive(Debug, Clone)]
pub struct CsrfToken {
    /// The bare token the client echoes back in the request header.
    pub token: String,
    /// `token.signature`, stored in the cookie.
    pub cookie_payload: String,
}

fn sign(secret: &[u8], token: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| Error::Internal {
        operation: format!("create hmac: {e}"),
    })?;
    mac.update(token.as_bytes());
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

fn verify_signature(secret: &[u8], token: &str, signature: &str) -> bool {
    let Ok(signature) = general_purpose::URL_SAFE_NO_PAD.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(token.as_bytes());
    mac.verify_slice(&signature).is_ok()
}

/// Issue a new token signed with the server secret.
pub fn issue(secret: &[u8]) -> Result<CsrfToken> {
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);
    let token = general_purpose::URL_SAFE_NO_PAD.encode(token_bytes);

    let signature = sign(secret, &token)?;
    let cookie_payload = format!("{token}.{signature}");
    Ok(CsrfToken { token, cookie_payload })
}

/// Check a request's cookie payload against the header echo.
///
/// Both the cookie token and the header token are verified against the
/// signature, so each comparison is the hmac crate's constant-time check.
pub fn verify(secret: &[u8], cookie_payload: &str, header_token: &str) -> bool {
    let Some((token, signature)) = cookie_payload.rsplit_once('.') else {
        return false;
    };
    verify_signature(secret, token, signature) && verify_signature(secret, header_token, signature)
}

/// Serialize the anti-forgery cookie.
pub fn csrf_cookie(config: &CsrfConfig, payload: &str, secure: bool) -> String {
    let mut cookie = format!("{}={payload}; Path=/; HttpOnly; SameSite=Lax", config.cookie_name);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Middleware rejecting mutating requests without a valid token pair.
/// Safe methods pass through untouched.
pub async fn require_csrf(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(request).await);
    }

    let csrf = &state.config.auth.csrf;
    let secret = state.secret_key();

    let cookie_payload = request
        .headers()
        .get(axum::http::header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| cookie_value(h, &csrf.cookie_name));
    let header_token = request.headers().get(csrf.header_name.as_str()).and_then(|h| h.to_str().ok());

    match (cookie_payload, header_token) {
        (Some(payload), Some(token)) if verify(secret, payload, token) => Ok(next.run(request).await),
        _ => Err(Error::CsrfMismatch),
    }
}
