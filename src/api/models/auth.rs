//! API models for the authentication endpoints.

use crate::api::models::users::UserResponse;
use crate::config::PasswordConfig;
use crate::errors::{Error, FieldError, Result};
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SignUpRequest {
    pub fn validate(&self, policy: &PasswordConfig) -> Result<()> {
        let mut errors = Vec::new();
        if !looks_like_email(&self.email) {
            errors.push(FieldError {
                field: "email".to_string(),
                message: "Enter a valid email address".to_string(),
            });
        }
        if self.password.len() < policy.min_length {
            errors.push(FieldError {
                field: "password".to_string(),
                message: format!("Password must be at least {} characters", policy.min_length),
            });
        } else if self.password.len() > policy.max_length {
            errors.push(FieldError {
                field: "password".to_string(),
                message: format!("Password must be at most {} characters", policy.max_length),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

impl SignInRequest {
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if !looks_like_email(&self.email) {
            errors.push(FieldError {
                field: "email".to_string(),
                message: "Enter a valid email address".to_string(),
            });
        }
        if self.password.is_empty() {
            errors.push(FieldError {
                field: "password".to_string(),
                message: "Password is required".to_string(),
            });
        }
        if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
    }
}

/// The anti-forgery token for the client to echo back in a header.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CsrfTokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthSuccessResponse {
    pub message: String,
}

fn with_cookie(status: StatusCode, cookie: &str, mut response: Response) -> Response {
    *response.status_mut() = status;
    if let Ok(value) = header::HeaderValue::from_str(cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Sign-up result carrying the session cookie.
pub struct SignUpResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for SignUpResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::CREATED, &self.cookie, Json(self.auth_response).into_response())
    }
}

/// Sign-in result carrying the session cookie.
pub struct SignInResponse {
    pub auth_response: AuthResponse,
    pub cookie: String,
}

impl IntoResponse for SignInResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, Json(self.auth_response).into_response())
    }
}

/// Sign-out result carrying the cleared session cookie.
pub struct SignOutResponse {
    pub auth_response: AuthSuccessResponse,
    pub cookie: String,
}

impl IntoResponse for SignOutResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, Json(self.auth_response).into_response())
    }
}

/// Anti-forgery token result carrying the signed cookie.
pub struct CsrfIssueResponse {
    pub token_response: CsrfTokenResponse,
    pub cookie: String,
}

impl IntoResponse for CsrfIssueResponse {
    fn into_response(self) -> Response {
        with_cookie(StatusCode::OK, &self.cookie, Json(self.token_response).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PasswordConfig {
        PasswordConfig::default()
    }

    #[test]
    fn test_sign_up_validation() {
        let ok = SignUpRequest {
            email: "a@example.com".to_string(),
            password: "longenough".to_string(),
            display_name: None,
        };
        assert!(ok.validate(&policy()).is_ok());

        let bad = SignUpRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            display_name: None,
        };
        let err = bad.validate(&policy()).unwrap_err();
        let Error::Validation { errors } = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_password_length_bounds() {
        let too_long = SignUpRequest {
            email: "a@example.com".to_string(),
            password: "x".repeat(51),
            display_name: None,
        };
        assert!(too_long.validate(&policy()).is_err());
    }

    #[test]
    fn test_sign_in_validation() {
        let bad = SignInRequest {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert!(bad.validate().is_err());
    }
}
