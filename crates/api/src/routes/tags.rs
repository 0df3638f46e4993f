//! Tag route handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use shopfloor_core::TagId;

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{Tag, TagDetails, TagInput};
use crate::state::AppState;

/// Build the tags router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
}

fn not_found() -> AppError {
    AppError::NotFound("Tag not found".to_owned())
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<TagDetails>>> {
    Ok(Json(state.store().list_tags().await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TagId>,
) -> Result<Json<TagDetails>> {
    let tag = state.store().get_tag(id).await?.ok_or_else(not_found)?;
    Ok(Json(tag))
}

#[tracing::instrument(skip(state, input))]
pub async fn create(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TagInput>,
) -> Result<Json<Tag>> {
    let name = input.validate()?;
    let tag = state.store().create_tag(&name).await?;
    tracing::info!(tag_id = %tag.id, "Tag created");
    Ok(Json(tag))
}

#[tracing::instrument(skip(state, input))]
pub async fn update(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TagId>,
    ApiJson(input): ApiJson<TagInput>,
) -> Result<Json<Tag>> {
    let name = input.validate()?;
    let tag = state
        .store()
        .update_tag(id, &name)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(tag))
}

#[tracing::instrument(skip(state))]
pub async fn destroy(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<TagId>,
) -> Result<Json<Value>> {
    if !state.store().delete_tag(id).await? {
        return Err(not_found());
    }
    tracing::info!(tag_id = %id, "Tag deleted");
    Ok(Json(json!({ "message": "Tag deleted" })))
}
