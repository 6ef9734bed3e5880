use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod appointments;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod profile;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/appointments", appointments::router())
        .nest("/profile", profile::router())
        .nest("/admin", admin::router())
}
