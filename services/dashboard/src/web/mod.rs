pub mod rest;
pub mod state;

pub use rest::{compare_student_handler, health_handler, list_students_handler, openapi_json, ApiDoc};
pub use state::AppState;

use axum::{http::Method, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full router: JSON endpoints plus the Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Read-only surface.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    let api_router = Router::new()
        .route("/health", get(health_handler))
        .route("/students", get(list_students_handler))
        .route(
            "/students/{student_id}/comparison",
            get(compare_student_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
