//! Cart route handlers.
//!
//! These read identity from the session through [`RequestContext`] rather than
//! `RequireAuth`, so an anonymous caller gets the sign-up prompt as a 401 body.

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use shopfloor_core::ProductId;

use crate::error::Result;
use crate::extract::ApiPath;
use crate::models::{CartEntry, RequestContext};
use crate::services::CartManager;
use crate::state::AppState;

/// Build the cart router, nested under `/api/products`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addtocart/{id}", get(add))
        .route("/removecart/{id}", get(remove))
        .route("/cart", get(list))
}

/// Add one unit of a product to the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn add(
    ctx: RequestContext,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    CartManager::new(state.store()).add(&ctx, id).await?;
    Ok(Json(json!({ "message": "Product added to cart" })))
}

/// Remove one unit of a product from the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn remove(
    ctx: RequestContext,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Value>> {
    CartManager::new(state.store()).remove(&ctx, id).await?;
    Ok(Json(json!({ "message": "Product removed from cart" })))
}

/// The caller's cart entries.
pub async fn list(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<Vec<CartEntry>>> {
    let entries = CartManager::new(state.store()).list(&ctx).await?;
    Ok(Json(entries))
}
