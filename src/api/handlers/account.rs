use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{AuthSuccessResponse, SignOutResponse},
        users::{AccountUpdateRequest, CurrentUser, UserResponse},
    },
    auth::{current_user::CurrentSession, session},
    db::{
        errors::DbError,
        handlers::{repository::Repository, users::Users},
        models::users::UserUpdateDBRequest,
    },
    errors::Error,
};

/// The signed-in user's account
#[utoipa::path(
    get,
    path = "/account",
    tag = "account",
    responses(
        (status = 200, description = "Account details", body = UserResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_account(State(state): State<AppState>, user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let account = Users::new(&mut conn).get_by_id(user.id).await?.ok_or(Error::NotFound {
        resource: "user".to_string(),
        id: user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(account)))
}

/// Update the signed-in user's profile
#[utoipa::path(
    patch,
    path = "/account",
    request_body = AccountUpdateRequest,
    tag = "account",
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<AccountUpdateRequest>,
) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let updated = Users::new(&mut conn)
        .update(
            user.id,
            &UserUpdateDBRequest {
                display_name: request.display_name,
                avatar_url: request.avatar_url,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Delete the signed-in user's account
#[utoipa::path(
    delete,
    path = "/account",
    tag = "account",
    responses(
        (status = 200, description = "Account deleted", body = AuthSuccessResponse),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentSession(context): CurrentSession,
) -> Result<SignOutResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    // Credentials and sessions go with the user row via cascades.
    Users::new(&mut conn).delete(context.user.id).await?;

    Ok(SignOutResponse {
        auth_response: AuthSuccessResponse {
            message: "Account deleted".to_string(),
        },
        cookie: session::clear_session_cookie(&state.config.auth.session),
    })
}
