//! services/gateway/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::{error::ApiError, web::state::AppState};
use axum::{extract::State, response::Json};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
    ),
    components(
        schemas(HealthResponse)
    ),
    tags(
        (
            name = "Gallery Gateway",
            description = "Operational endpoints. Gallery requests go over the WebSocket."
        )
    )
)]
pub struct ApiDoc;

/// Writes the OpenAPI document for the REST routes to `path` as pretty JSON.
pub fn write_openapi(path: &Path) -> Result<(), ApiError> {
    let spec_json = ApiDoc::openapi()
        .to_pretty_json()
        .map_err(|e| ApiError::Internal(format!("Could not render OpenAPI: {}", e)))?;
    std::fs::write(path, spec_json)?;
    Ok(())
}

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct HealthResponse {
    status: String,
    /// Number of entries in the loaded tag taxonomy.
    tags_loaded: usize,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The gateway is up", body = HealthResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        tags_loaded: app_state.taxonomy.len(),
    })
}
