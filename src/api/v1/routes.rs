/*
 * Responsibility
 * - v1 URL structure
 * - /testresults endpoints all sit behind the auth middleware; the
 *   per-operation requirement is enforced in each handler
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::test_results::{clear_results, read_summary, submit_result};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/testresults/result", post(submit_result))
        .route("/testresults/summary", get(read_summary))
        .route("/testresults/clear", post(clear_results))
}
