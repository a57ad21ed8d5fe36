use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::Identity;
use crate::state::AppState;

/// Extractor handing the request's resolved [`Identity`] to a handler.
/// The auth middleware must have inserted it into request extensions; a
/// missing identity means the middleware is not wired, which is a server
/// misconfiguration rather than a caller error.
pub struct Caller(pub Identity);

impl FromRequestParts<AppState> for Caller
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Caller)
            .ok_or(AppError::Internal)
    }
}
