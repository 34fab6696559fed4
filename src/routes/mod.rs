pub mod caregivers;
pub mod health;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Caregiver profiles
        .route(
            "/caregivers",
            get(caregivers::list_caregivers).post(caregivers::create_caregiver),
        )
        .route(
            "/caregivers/:id",
            get(caregivers::get_caregiver)
                .put(caregivers::get_or_create_caregiver)
                .patch(caregivers::update_caregiver)
                .delete(caregivers::delete_caregiver),
        )
        .route(
            "/caregivers/:id/completeness",
            get(caregivers::get_completeness),
        )
}
