//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (store reachable)
//!
//! # Products
//! GET    /api/products              - Product listing (category + tags)
//! GET    /api/products/{id}         - Product detail, or null
//! POST   /api/products              - Create product (requires auth)
//! PUT    /api/products/{id}         - Update product + reconcile tags (requires auth)
//! DELETE /api/products/{id}         - Delete product (requires auth)
//!
//! # Cart (session identity)
//! GET  /api/products/addtocart/{id} - Add one unit
//! GET  /api/products/removecart/{id} - Remove one unit
//! GET  /api/products/cart           - Caller's cart
//!
//! # Categories / Tags
//! GET    /api/categories[/{id}]     - With products
//! POST   /api/categories            - Create (requires auth)
//! PUT    /api/categories/{id}       - Rename (requires auth)
//! DELETE /api/categories/{id}       - Delete (requires auth)
//! (same shape under /api/tags)
//!
//! # Users
//! POST /api/users                   - Sign up (and log in)
//! POST /api/users/login             - Log in
//! POST /api/users/logout            - Log out
//! ```

pub mod cart;
pub mod categories;
pub mod products;
pub mod tags;
pub mod users;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Create the full API router (without session or tracing layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/products", products::router().merge(cart::router()))
        .nest("/api/categories", categories::router())
        .nest("/api/tags", tags::router())
        .nest("/api/users", users::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
