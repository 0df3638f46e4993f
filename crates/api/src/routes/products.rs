//! Product route handlers.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use shopfloor_core::ProductId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::models::{ProductDetails, ProductInput};
use crate::services::{CreatedProduct, ProductService, TagChanges};
use crate::state::AppState;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(destroy))
}

/// List all products with their category and tags.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductDetails>>> {
    let products = ProductService::new(state.store()).list().await?;
    Ok(Json(products))
}

/// One product with its category and tags; `null` when it does not exist.
#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Option<ProductDetails>>> {
    let product = ProductService::new(state.store()).get(id).await?;
    Ok(Json(product))
}

/// Create a product, returning it or its join rows when `tagIds` is non-empty.
#[tracing::instrument(skip(state, input))]
pub async fn create(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<CreatedProduct>> {
    let created = ProductService::new(state.store()).create(input).await?;
    Ok(Json(created))
}

/// Update a product and reconcile its tags.
#[tracing::instrument(skip(state, input))]
pub async fn update(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<TagChanges>> {
    let changes = ProductService::new(state.store()).update(id, input).await?;
    Ok(Json(changes))
}

/// Delete a product and its join rows.
#[tracing::instrument(skip(state))]
pub async fn destroy(
    RequireAuth(user_id): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    ProductService::new(state.store()).delete(id).await?;
    Ok(Json(json!({ "msg": "Product deleted" })))
}
