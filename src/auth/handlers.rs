use axum::{
    extract::{FromRef, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{Credentials, PublicUser, TokenResponse},
        errors::ApiError,
        extractors::{AuthUser, Payload},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_dummy_blocking, verify_password_blocking},
        repo_types::NewUser,
        validation::{validate_new_password, validate_username},
    },
    state::AppState,
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/create/", post(create_user))
        .route("/auth/", post(issue_token))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/profile/",
        get(get_profile).put(reject_update).patch(reject_update),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Payload(payload): Payload<Credentials>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let username = validate_username(&payload.username).inspect_err(|_| {
        warn!("invalid username");
    })?;
    validate_new_password(&payload.password).inspect_err(|_| {
        warn!(username = %username, "password too short");
    })?;

    let password_hash = hash_password_blocking(payload.password).await?;

    let user = state
        .users
        .create(NewUser {
            username,
            password_hash,
        })
        .await
        .inspect_err(|e| warn!(error = %e, "create user failed"))?;

    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn issue_token(
    State(state): State<AppState>,
    Payload(payload): Payload<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    // stored usernames are trimmed at creation; passwords are taken verbatim
    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username", "This field may not be blank."));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password", "This field may not be blank."));
    }

    let Some(user) = state.users.find_by_username(username).await? else {
        // same argon2 cost as a real mismatch
        verify_dummy_blocking(payload.password).await?;
        warn!(username = %username, "token request for unknown username");
        return Err(ApiError::InvalidCredentials);
    };

    let ok = verify_password_blocking(payload.password, user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "token request with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

/// Profiles are read-only; identity is still resolved first so anonymous
/// callers see 401 rather than 405.
#[instrument(skip_all, fields(user_id = %user.id, method = %method))]
pub async fn reject_update(method: Method, AuthUser(user): AuthUser) -> ApiError {
    warn!("profile update rejected");
    ApiError::MethodNotAllowed(method)
}
