//! HTTP adapter over the resolution workflow.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use combo_core::JobPoll;
use serde_json::json;

use crate::context::AppContext;
use crate::error::{ResolveError, json_error};
use crate::resolve::Resolution;

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/items/:first/:second", get(combine))
        .route("/task/:job_id", get(task_status))
        .route("/health", get(health))
        .with_state(ctx)
}

/// `GET /items/{first}/{second}`: the item, or `{"enqueued": job_id}`.
async fn combine(
    State(ctx): State<AppContext>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Response, ResolveError> {
    let Path((first, second)) = match ids {
        Ok(ids) => ids,
        Err(rejection) => {
            return Ok(json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_argument",
                rejection.body_text(),
            ));
        }
    };

    Ok(match ctx.resolver.resolve(first, second).await? {
        Resolution::Item(item) => Json(item).into_response(),
        Resolution::Pending(job_id) => Json(json!({ "enqueued": job_id })).into_response(),
    })
}

/// `GET /task/{job_id}`: `{"status": ...}`, plus `"result"` once complete.
async fn task_status(
    State(ctx): State<AppContext>,
    Path(job_id): Path<String>,
) -> Result<Response, ResolveError> {
    let status = ctx.resolver.poll_job(&job_id).await?;
    let code = match status {
        JobPoll::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };
    Ok((code, Json(status)).into_response())
}

async fn health(State(ctx): State<AppContext>) -> Response {
    match ctx.health().await {
        Ok(()) => Json(json!({ "status": "ok" })).into_response(),
        Err(e) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "storage_unavailable",
            e.to_string(),
        ),
    }
}
