//! Caregiver profile routes
//!
//! Thin JSON wrappers over the profile store and the completeness scorer.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::domain::{CaregiverUpdate, CompletenessReport};
use crate::error::{ApiError, ApiResult};

/// Body of `POST /caregivers`; may be omitted entirely
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCaregiverRequest {
    #[serde(default)]
    pub id: Option<String>,
}

impl CreateCaregiverRequest {
    fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))
    }
}

/// POST /caregivers
///
/// Create a blank profile, optionally with a caller-chosen id.
pub async fn create_caregiver(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = CreateCaregiverRequest::from_body(&body)?;
    let caregiver = state.store.create(req.id).await?;
    Ok(Created(DataResponse::new(caregiver)))
}

/// GET /caregivers
pub async fn list_caregivers(
    State(state): State<Arc<AppState>>,
) -> ApiResult<impl IntoResponse> {
    let caregivers = state.store.list_all().await?;
    tracing::debug!(count = caregivers.len(), "Listing caregivers");
    Ok(DataResponse::new(caregivers))
}

/// GET /caregivers/:id
pub async fn get_caregiver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let caregiver = state
        .store
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("caregiver '{}' not found", id)))?;
    Ok(DataResponse::new(caregiver))
}

/// PUT /caregivers/:id
///
/// Fetch the profile, creating a blank one on first contact.
pub async fn get_or_create_caregiver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let caregiver = state.store.get_or_create(&id).await?;
    Ok(DataResponse::new(caregiver))
}

/// PATCH /caregivers/:id
///
/// Merge a partial update into the stored profile.
pub async fn update_caregiver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<CaregiverUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(update) = payload?;
    let caregiver = state.store.update(&id, update).await?;
    Ok(DataResponse::new(caregiver))
}

/// DELETE /caregivers/:id
pub async fn delete_caregiver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<NoContent> {
    if state.store.delete(&id).await? {
        Ok(NoContent)
    } else {
        Err(ApiError::not_found(format!("caregiver '{}' not found", id)))
    }
}

/// GET /caregivers/:id/completeness
pub async fn get_completeness(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let caregiver = state
        .store
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("caregiver '{}' not found", id)))?;
    let report = CompletenessReport::for_caregiver(&caregiver);
    tracing::debug!(
        caregiver_id = %report.caregiver_id,
        completion_percentage = report.completion_percentage,
        status = report.status.label(),
        "Scored caregiver profile"
    );
    Ok(DataResponse::new(report))
}
