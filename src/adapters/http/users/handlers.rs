//! HTTP handlers for quota endpoints.
//!
//! Each handler parses the path/body, calls one `QuotaService` operation and
//! maps the outcome to JSON.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::QuotaService;
use crate::domain::foundation::UserId;
use crate::domain::quota::QuotaError;

use super::dto::{
    AddUserRequest, AllowedResponse, ErrorResponse, HealthResponse, QuotaRecordResponse,
    QuotaUsageResponse, UserCreatedResponse, UserDeletedResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state cloned into every request.
#[derive(Clone)]
pub struct UsersAppState {
    pub quota_service: Arc<QuotaService>,
}

impl UsersAppState {
    pub fn new(quota_service: Arc<QuotaService>) -> Self {
        Self { quota_service }
    }
}

fn parse_user_id(raw: String) -> Result<UserId, QuotaApiError> {
    UserId::new(raw).map_err(|e| QuotaApiError(e.into()))
}

// ════════════════════════════════════════════════════════════════════════════════
// User lifecycle
// ════════════════════════════════════════════════════════════════════════════════

/// POST /users - Register a user
pub async fn add_user(
    State(state): State<UsersAppState>,
    body: Result<Json<AddUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let Json(request) = body.map_err(|rejection| {
        QuotaApiError(QuotaError::validation("body", rejection.body_text()))
    })?;
    let user_id = parse_user_id(request.user_id)?;

    let created = state
        .quota_service
        .add_user(&user_id, &request.user_type)
        .await?;

    Ok((StatusCode::CREATED, Json(UserCreatedResponse::from(created))))
}

/// GET /users/:user_id - Counters, limits and headroom
pub async fn get_usage(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let usage = state.quota_service.get_usage(&user_id).await?;
    Ok(Json(QuotaUsageResponse::from(usage)))
}

/// DELETE /users/:user_id - Remove a user
pub async fn delete_user(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let deleted = state.quota_service.delete_user(&user_id).await?;
    Ok(Json(UserDeletedResponse::from(deleted)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Checks
// ════════════════════════════════════════════════════════════════════════════════

/// GET /users/:user_id/can-create-deck
pub async fn can_create_deck(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let allowed = state.quota_service.can_create_deck(&user_id).await?;
    Ok(Json(AllowedResponse { allowed }))
}

/// GET /users/:user_id/can-publish-deck
pub async fn can_publish_deck(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let allowed = state.quota_service.can_publish_deck(&user_id).await?;
    Ok(Json(AllowedResponse { allowed }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Counter changes
// ════════════════════════════════════════════════════════════════════════════════

/// POST /users/:user_id/create-deck
pub async fn create_deck(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let record = state.quota_service.create_deck(&user_id).await?;
    Ok(Json(QuotaRecordResponse::from(record)))
}

/// POST /users/:user_id/publish-deck
pub async fn publish_deck(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let record = state.quota_service.publish_deck(&user_id).await?;
    Ok(Json(QuotaRecordResponse::from(record)))
}

/// POST /users/:user_id/delete-created-deck
pub async fn delete_created_deck(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let record = state.quota_service.delete_created_deck(&user_id).await?;
    Ok(Json(QuotaRecordResponse::from(record)))
}

/// POST /users/:user_id/delete-published-deck
pub async fn delete_published_deck(
    State(state): State<UsersAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, QuotaApiError> {
    let user_id = parse_user_id(user_id)?;
    let record = state.quota_service.delete_published_deck(&user_id).await?;
    Ok(Json(QuotaRecordResponse::from(record)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper that converts quota errors to HTTP responses.
#[derive(Debug)]
pub struct QuotaApiError(pub QuotaError);

impl From<QuotaError> for QuotaApiError {
    fn from(err: QuotaError) -> Self {
        Self(err)
    }
}

impl QuotaApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            QuotaError::QuotaExceeded(_)
            | QuotaError::NothingToDelete(_)
            | QuotaError::InvalidUserType(_)
            | QuotaError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            QuotaError::AlreadyExists(_) => StatusCode::CONFLICT,
            QuotaError::NotFound(_) => StatusCode::NOT_FOUND,
            QuotaError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for QuotaApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = ErrorResponse::new(self.0.code().as_str(), self.0.message());
        (status, Json(body)).into_response()
    }
}
