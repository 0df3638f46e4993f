//! Authentication extractors and session helpers.
//!
//! [`RequestContext`] is the request-scoped identity every handler can take;
//! it never rejects. [`RequireAuth`] rejects with 401 before the handler body
//! runs and guards catalog writes.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use shopfloor_core::UserId;

use crate::models::{RequestContext, session_keys};

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user_id): RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {user_id}!")
/// }
/// ```
pub struct RequireAuth(pub UserId);

/// Error returned when authentication is required but the user is not logged in.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "You must be logged in" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_from_session(parts)
            .await
            .user_id
            .map(Self)
            .ok_or(AuthRejection)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(context_from_session(parts).await)
    }
}

/// Read the identity from the session; anonymous if there is no session or it
/// cannot be read.
async fn context_from_session(parts: &Parts) -> RequestContext {
    // Get the session from extensions (set by SessionManagerLayer)
    let Some(session) = parts.extensions.get::<Session>() else {
        return RequestContext::anonymous();
    };

    let user_id = session
        .get::<UserId>(session_keys::USER_ID)
        .await
        .ok()
        .flatten();
    let logged_in = session
        .get::<bool>(session_keys::LOGGED_IN)
        .await
        .ok()
        .flatten();

    RequestContext::from_session(user_id, logged_in)
}

/// Mark the session as logged in for a user.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn log_in(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::USER_ID, user_id).await?;
    session.insert(session_keys::LOGGED_IN, true).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn log_out(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
