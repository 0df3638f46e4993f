//! User account route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::error::{self, AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::{log_in, log_out};
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Email and password request body.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub email: String,
    pub password: String,
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

/// Create an account and log it in.
#[tracing::instrument(skip_all, fields(email = %form.email))]
pub async fn signup(
    session: Session,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<CredentialsForm>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.store())
        .register(&form.email, &form.password)
        .await?;

    log_in(&session, user.id).await.map_err(|e| session_error(&e))?;
    error::set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
#[tracing::instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    session: Session,
    State(state): State<AppState>,
    ApiJson(form): ApiJson<CredentialsForm>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.store())
        .login(&form.email, &form.password)
        .await?;

    log_in(&session, user.id).await.map_err(|e| session_error(&e))?;
    error::set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(user))
}

/// Log out, discarding the session.
pub async fn logout(session: Session) -> Result<Json<Value>> {
    log_out(&session).await.map_err(|e| session_error(&e))?;
    error::clear_sentry_user();
    Ok(Json(json!({ "message": "Logged out" })))
}
