//! HTTP routes.

use axum::{Router, routing::post};

use crate::state::AppState;

pub mod partner;

/// Build the service router.
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new().route("/partner/update", post(partner::update_catalog))
}
