//! Request extractors for the authenticated user and their session.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::middleware::SessionContext,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self> {
        parts
            .extensions
            .get::<SessionContext>()
            .map(|ctx| ctx.user.clone())
            .ok_or(Error::Unauthenticated { message: None })
    }
}

/// The full session context, for handlers that need the raw token
/// (sign-out, session introspection).
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionContext);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .map(CurrentSession)
            .ok_or(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_app_state;
    use axum::http::Request;
    use sqlx::SqlitePool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_session_rejected(pool: SqlitePool) {
        let state = create_test_app_state(pool).await;

        let request = Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_annotated_session_extracted(pool: SqlitePool) {
        let state = create_test_app_state(pool).await;

        let request = Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        parts.extensions.insert(SessionContext {
            user: CurrentUser {
                id: Uuid::new_v4(),
                email: "user@example.com".to_string(),
                display_name: None,
                avatar_url: None,
            },
            token: "token".to_string(),
            renewed: false,
        });

        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.email, "user@example.com");

        let session = CurrentSession::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.0.token, "token");
    }
}
