use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    Form, Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::{errors::ApiError, jwt::JwtKeys, repo_types::User};
use crate::state::AppState;

/// Authenticated caller, resolved from the `Authorization` header.
///
/// Accepts `Bearer <token>` and `Token <token>`; the user must still exist.
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthorized(
            "Authentication credentials were not provided.",
        ))?;

    let (scheme, token) = auth
        .split_once(' ')
        .ok_or(ApiError::Unauthorized("Invalid Authorization header."))?;
    if !(scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token")) {
        return Err(ApiError::Unauthorized("Invalid Authorization header."));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthorized("Invalid Authorization header."));
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token.")
        })?;

        match state.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(AuthUser(user)),
            None => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Err(ApiError::Unauthorized("Invalid or expired token."))
            }
        }
    }
}

/// Request body accepted as JSON or `application/x-www-form-urlencoded`.
/// Decoding failures become a 400 instead of axum's default 415/422.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rej| ApiError::BadRequest(rej.body_text()))?;
            Ok(Payload(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|rej| ApiError::BadRequest(rej.body_text()))?;
            Ok(Payload(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = HttpRequest::builder().uri("/api/profile/");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn accepts_bearer_and_token_schemes() {
        assert_eq!(bearer_token(&parts_with_auth(Some("Bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts_with_auth(Some("bearer abc"))).unwrap(), "abc");
        assert_eq!(bearer_token(&parts_with_auth(Some("Token abc"))).unwrap(), "abc");
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        for value in [None, Some("abc"), Some("Basic abc"), Some("Bearer "), Some("Bearer")] {
            let err = bearer_token(&parts_with_auth(value)).unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)), "{value:?}");
        }
    }
}
