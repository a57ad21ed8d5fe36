//! Authentication middleware: resolve the caller identity once per request
//! and hand it to handlers through request extensions.
//!
//! The middleware never rejects by itself. An anonymous identity is a valid
//! terminal state; whether anonymous is acceptable for a given operation is
//! the requirement registry's call, made handler-side.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::state::AppState;

/// Attach authentication to a router.
///
/// Example:
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: from_fn cannot take a State extractor, so pass state
    // explicitly via from_fn_with_state.
    router.layer(middleware::from_fn_with_state(state, authenticate))
}

async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let identity = state.authenticator.authenticate(req.headers());

    tracing::debug!(
        scheme = identity.scheme(),
        authenticated = identity.is_authenticated(),
        "request authenticated"
    );

    // middleware → extractor handoff
    req.extensions_mut().insert(identity);

    next.run(req).await
}
