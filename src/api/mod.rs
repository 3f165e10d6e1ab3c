use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::PlannerError;
use crate::models::{LayoverPlan, PlanRequest, PlanningContext};
use crate::planner::LayoverPlanner;

#[derive(Debug, Default, Deserialize)]
pub struct PlanParams {
    #[serde(default)]
    pub include_debug: bool,
}

#[derive(Serialize)]
pub struct DebugPlanResponse {
    pub plan: LayoverPlan,
    pub debug_ctx: PlanningContext,
}

/// Error body `{"detail": ...}` with the mapped status
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Planning failed: {}", err);
        } else {
            warn!("Planning request rejected: {}", err);
        }
        Self {
            status,
            detail: err.user_message(),
        }
    }
}

/// Every body problem (syntax, content type, field values) is a 422
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Malformed planning request: {}", rejection.body_text());
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(planner: Arc<LayoverPlanner>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/v1/layover/plan", post(plan_layover))
        .with_state(planner)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn plan_layover(
    State(planner): State<Arc<LayoverPlanner>>,
    Query(params): Query<PlanParams>,
    body: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body?;
    info!(
        "Planning layover at {} ({} min)",
        request.airport_code(),
        request.layover_minutes()
    );

    let outcome = planner.plan(&request, params.include_debug).await?;
    let response = match outcome.debug_ctx {
        Some(debug_ctx) => Json(DebugPlanResponse {
            plan: outcome.plan,
            debug_ctx,
        })
        .into_response(),
        None => Json(outcome.plan).into_response(),
    };
    Ok(response)
}
