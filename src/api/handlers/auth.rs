use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::{
        auth::{
            AuthResponse, AuthSuccessResponse, CsrfIssueResponse, CsrfTokenResponse, SignInRequest, SignInResponse,
            SignOutResponse, SignUpRequest, SignUpResponse,
        },
        users::{CurrentUser, UserResponse},
    },
    auth::{csrf, current_user::CurrentSession, password, session},
    db::{
        errors::DbError,
        handlers::{credentials::Credentials, repository::Repository, users::Users},
        models::{
            credentials::{CredentialCreateDBRequest, EMAIL_PROVIDER},
            users::UserCreateDBRequest,
        },
    },
    errors::Error,
};

/// Register a new account and start a session
#[utoipa::path(
    post,
    path = "/authentication/sign-up",
    request_body = SignUpRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "An account with this email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn sign_up(State(state): State<AppState>, Json(request): Json<SignUpRequest>) -> Result<SignUpResponse, Error> {
    request.validate(&state.config.auth.password)?;
    let email = request.email.trim().to_lowercase();

    // Hash before opening the transaction; Argon2 takes tens of milliseconds.
    let password_hash = password::hash_password(request.password).await?;

    let mut tx = state.db.begin().await.map_err(DbError::from)?;

    let user = Users::new(tx.as_mut())
        .create(&UserCreateDBRequest {
            email: email.clone(),
            display_name: request.display_name,
            avatar_url: None,
        })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => Error::DuplicateIdentity,
            other => Error::Database(other),
        })?;

    Credentials::new(tx.as_mut())
        .create(&CredentialCreateDBRequest {
            provider: EMAIL_PROVIDER.to_string(),
            provider_user_id: email,
            user_id: user.id,
            password_hash: Some(password_hash),
        })
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => Error::DuplicateIdentity,
            other => Error::Database(other),
        })?;

    // The session is part of the same transaction: a failed sign-up leaves
    // neither a user, a credential, nor a session behind.
    let record = session::create_session(tx.as_mut(), &state.config.auth.session, user.id).await?;

    tx.commit().await.map_err(DbError::from)?;

    let cookie = session::session_cookie(&state.config.auth.session, &record.id);
    Ok(SignUpResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Registration successful".to_string(),
        },
        cookie,
    })
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/authentication/sign-in",
    request_body = SignInRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Incorrect email or password"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn sign_in(State(state): State<AppState>, Json(request): Json<SignInRequest>) -> Result<SignInResponse, Error> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let credential = Credentials::new(&mut conn).get(EMAIL_PROVIDER, &email).await?;

    // Unknown identities still pay for a hash, so response times do not
    // reveal which emails are registered.
    let stored_hash = credential.as_ref().and_then(|c| c.password_hash.clone());
    let is_valid = password::verify_password(request.password, stored_hash).await?;

    let user = match (is_valid, credential) {
        (true, Some(credential)) => Users::new(&mut conn).get_by_id(credential.user_id).await?,
        _ => None,
    };
    let Some(user) = user else {
        return Err(Error::InvalidCredentials);
    };

    let record = session::create_session(&mut conn, &state.config.auth.session, user.id).await?;

    let cookie = session::session_cookie(&state.config.auth.session, &record.id);
    Ok(SignInResponse {
        auth_response: AuthResponse {
            user: UserResponse::from(user),
            message: "Sign-in successful".to_string(),
        },
        cookie,
    })
}

/// Sign out and invalidate the current session
#[utoipa::path(
    post,
    path = "/authentication/sign-out",
    tag = "authentication",
    responses(
        (status = 200, description = "Signed out", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn sign_out(
    State(state): State<AppState>,
    session: Result<CurrentSession, Error>,
) -> Result<SignOutResponse, Error> {
    // Signing out without a live session still clears the cookie.
    if let Ok(CurrentSession(context)) = session {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        session::invalidate_session(&mut conn, &context.token).await?;
    }

    Ok(SignOutResponse {
        auth_response: AuthSuccessResponse {
            message: "Signed out".to_string(),
        },
        cookie: session::clear_session_cookie(&state.config.auth.session),
    })
}

/// The currently authenticated user
#[utoipa::path(
    get,
    path = "/authentication/me",
    tag = "authentication",
    responses(
        (status = 200, description = "The authenticated user", body = CurrentUser),
        (status = 401, description = "Not signed in"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(user: CurrentUser) -> Json<CurrentUser> {
    Json(user)
}

/// Issue an anti-forgery token
#[utoipa::path(
    get,
    path = "/authentication/csrf",
    tag = "authentication",
    responses(
        (status = 200, description = "A fresh anti-forgery token", body = CsrfTokenResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn csrf_token(State(state): State<AppState>) -> Result<CsrfIssueResponse, Error> {
    let issued = csrf::issue(state.secret_key())?;

    let cookie = csrf::csrf_cookie(&state.config.auth.csrf, &issued.cookie_payload, state.config.auth.session.cookie_secure);
    Ok(CsrfIssueResponse {
        token_response: CsrfTokenResponse { token: issued.token },
        cookie,
    })
}
