// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface of the provisioning service.
//!
//! Admission is request/response; pipeline progress is observed by polling
//! the status route. Pipeline failures never surface here as errors — they
//! appear as `state = "error"` on the next poll.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::provisioner::{AdmitRequest, ProvisioningService};
use crate::domain::provision::ProvisionError;

pub struct AppState {
    pub service: Arc<dyn ProvisioningService>,
}

pub fn app(service: Arc<dyn ProvisioningService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
        .route("/transfers", post(create_transfer))
        .route("/transfers/{id}", get(transfer_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "active" }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.health().await)
}

async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AdmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ack = state.service.admit(payload).await?;
    Ok(Json(ack))
}

async fn transfer_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.service.status(&id).await?;
    Ok(Json(status))
}

pub struct ApiError(ProvisionError);

impl From<ProvisionError> for ApiError {
    fn from(err: ProvisionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            ProvisionError::NotFound(_) => StatusCode::NOT_FOUND,
            ProvisionError::DuplicateRequest { .. } => StatusCode::CONFLICT,
            ProvisionError::InvalidSource(_) | ProvisionError::InvalidValidity => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
