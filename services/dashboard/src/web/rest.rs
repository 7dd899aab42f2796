//! services/dashboard/src/web/rest.rs
//!
//! Contains the Axum handlers for the dashboard's JSON endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use practice_diff_core::domain::{EntityId, Student};
use practice_diff_core::ports::PortError;
use practice_diff_core::reconcile::{Comparison, SourceView};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_students_handler,
        compare_student_handler,
    ),
    components(
        schemas(HealthResponse, StudentSummary, ComparisonResponse)
    ),
    tags(
        (name = "Practice Diff Dashboard", description = "Side-by-side reads of the store and the API for one student.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// One entry of the student picker.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentSummary {
    pub id: String,
    pub display_name: Option<String>,
    pub contact: Option<String>,
}

impl From<Student> for StudentSummary {
    fn from(student: Student) -> Self {
        Self {
            id: student.id.to_hex(),
            display_name: student.display_name,
            contact: student.contact,
        }
    }
}

/// The two panes for one student. Each pane is rendered as-is; no diff is computed.
#[derive(Serialize, ToSchema)]
pub struct ComparisonResponse {
    pub student: StudentSummary,
    #[schema(value_type = Object)]
    pub database: SourceView,
    #[schema(value_type = Object)]
    pub api: SourceView,
}

impl From<Comparison> for ComparisonResponse {
    fn from(comparison: Comparison) -> Self {
        Self {
            student: comparison.student.into(),
            database: comparison.database,
            api: comparison.api,
        }
    }
}

fn error_response(e: PortError) -> (StatusCode, String) {
    let status = match &e {
        PortError::MalformedReference(_) => StatusCode::BAD_REQUEST,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Transport(_) | PortError::Unauthorized(_) => StatusCode::BAD_GATEWAY,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// List every student known to the store.
#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "All students", body = Vec<StudentSummary>),
        (status = 502, description = "The document store is unreachable")
    )
)]
pub async fn list_students_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<StudentSummary>>, (StatusCode, String)> {
    let students = app_state.reconciler.students().await.map_err(|e| {
        error!("Failed to list students: {:?}", e);
        error_response(e)
    })?;
    Ok(Json(students.into_iter().map(StudentSummary::from).collect()))
}

/// Read both sources for one student and return them side by side.
///
/// Re-issuing the request is a full refresh; nothing is cached between calls.
#[utoipa::path(
    get,
    path = "/students/{student_id}/comparison",
    responses(
        (status = 200, description = "Database and API panes", body = ComparisonResponse),
        (status = 400, description = "Malformed student id"),
        (status = 404, description = "Unknown student"),
        (status = 502, description = "The document store is unreachable")
    ),
    params(
        ("student_id" = String, Path, description = "24-character hex id of the student.")
    )
)]
pub async fn compare_student_handler(
    State(app_state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<Json<ComparisonResponse>, (StatusCode, String)> {
    let student_id: EntityId = student_id.parse().map_err(error_response)?;
    let comparison = app_state
        .reconciler
        .compare_by_id(&student_id)
        .await
        .map_err(|e| {
            error!("Failed to compare student {}: {:?}", student_id, e);
            error_response(e)
        })?;
    Ok(Json(comparison.into()))
}

/// The OpenAPI document as pretty-printed JSON, as served at `/api-docs/openapi.json`.
pub fn openapi_json() -> Result<String, serde_json::Error> {
    ApiDoc::openapi().to_pretty_json()
}
