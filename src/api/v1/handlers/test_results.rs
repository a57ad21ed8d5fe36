use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::v1::dto::test_results::{TestResultRequest, TestSummaryResponse};
use crate::api::v1::extractors::Caller;
use crate::error::AppError;
use crate::services::auth::evaluate::operations;
use crate::services::metrics_store::{TestOutcome, TestResult};
use crate::state::AppState;

pub async fn submit_result(
    State(state): State<AppState>,
    Caller(identity): Caller,
    Json(request): Json<TestResultRequest>,
) -> Result<StatusCode, AppError> {
    state
        .requirements
        .authorize(operations::SUBMIT_RESULT, &identity)?;

    let outcome: TestOutcome = request.outcome.parse().map_err(|_| {
        AppError::InvalidRequest(format!(
            "unsupported outcome '{}', valid values: {}",
            request.outcome,
            TestOutcome::SUPPORTED.join(", ")
        ))
    })?;

    state.metrics.add(TestResult {
        build_id: request.build_id,
        test_name: request.test_name,
        outcome,
        duration_seconds: request.duration_seconds,
        completed_at: request.completed_at.unwrap_or_else(Utc::now),
    });

    Ok(StatusCode::ACCEPTED)
}

pub async fn read_summary(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<Json<TestSummaryResponse>, AppError> {
    state
        .requirements
        .authorize(operations::READ_SUMMARY, &identity)?;

    Ok(Json(state.metrics.summary().into()))
}

pub async fn clear_results(
    State(state): State<AppState>,
    Caller(identity): Caller,
) -> Result<StatusCode, AppError> {
    state
        .requirements
        .authorize(operations::CLEAR_RESULTS, &identity)?;

    state.metrics.clear();
    Ok(StatusCode::NO_CONTENT)
}
