use crate::api::models::organizations::OrgRole;
use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or session invalid/expired
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Unknown identity or wrong secret - collapsed into one variant so the
    /// response never distinguishes the two
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Sign-up with an identity that already exists
    #[error("An account with this email address already exists")]
    DuplicateIdentity,

    /// Authenticated but lacking the required organization role
    #[error("Requires {required} role in organization {organization}")]
    InsufficientRole { required: OrgRole, organization: String },

    /// Anti-forgery token missing or mismatched
    #[error("Invalid anti-forgery token")]
    CsrfMismatch,

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Typed per-field form validation failure
    #[error("Validation failed")]
    Validation { errors: Vec<FieldError> },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field-level validation failure, surfaced as structured JSON.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::DuplicateIdentity => StatusCode::CONFLICT,
            Error::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            Error::CsrfMismatch => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::InvalidCredentials => "Incorrect email or password".to_string(),
            Error::DuplicateIdentity => "An account with this email address already exists".to_string(),
            Error::InsufficientRole { required, .. } => {
                format!("This action requires the {required} role in the organization")
            }
            Error::CsrfMismatch => "Invalid anti-forgery token".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::Validation { .. } => "Validation failed".to_string(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { message, .. } => {
                    // Friendly messages for the constraints a client can actually trip
                    if message.contains("users.email") {
                        "An account with this email address already exists".to_string()
                    } else if message.contains("organizations.slug") {
                        "An organization with this slug already exists".to_string()
                    } else if message.contains("organization_members") {
                        "This user is already a member of the organization".to_string()
                    } else {
                        "Resource already exists".to_string()
                    }
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Something went wrong".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::InvalidCredentials | Error::InsufficientRole { .. } | Error::CsrfMismatch => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::Validation { .. } | Error::NotFound { .. } | Error::DuplicateIdentity => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Validation failures carry structured per-field errors
            Error::Validation { errors } => {
                use serde_json::json;
                let body = json!({
                    "message": "Validation failed",
                    "errors": errors,
                });
                (status, axum::response::Json(body)).into_response()
            }
            _ => {
                let user_message = self.user_message();
                (status, user_message).into_response()
            }
        }
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
