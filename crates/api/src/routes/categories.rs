//! Category route handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use shopfloor_core::CategoryId;

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{Category, CategoryDetails, CategoryInput};
use crate::state::AppState;

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
}

fn not_found() -> AppError {
    AppError::NotFound("Category not found".to_owned())
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategoryDetails>>> {
    Ok(Json(state.store().list_categories().await?))
}

pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryDetails>> {
    let category = state.store().get_category(id).await?.ok_or_else(not_found)?;
    Ok(Json(category))
}

#[tracing::instrument(skip(state, input))]
pub async fn create(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>> {
    let name = input.validate()?;
    let category = state.store().create_category(&name).await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok(Json(category))
}

#[tracing::instrument(skip(state, input))]
pub async fn update(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<Category>> {
    let name = input.validate()?;
    let category = state
        .store()
        .update_category(id, &name)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(category))
}

#[tracing::instrument(skip(state))]
pub async fn destroy(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Value>> {
    if !state.store().delete_category(id).await? {
        return Err(not_found());
    }
    tracing::info!(category_id = %id, "Category deleted");
    Ok(Json(json!({ "message": "Category deleted" })))
}
