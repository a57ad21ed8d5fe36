//! Factory: build the process-wide [`Authenticator`] from application config.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::services::auth::core::Authenticator;
use crate::services::auth::extract::AuthPipeline;
use crate::services::auth::identity::IdentityNormalizer;
use crate::services::auth::keys::KeyStore;
use crate::services::auth::token::TokenValidator;

pub fn build_authenticator(anchor: &AuthConfig) -> Result<Arc<Authenticator>, AppError> {
    let keys = KeyStore::from_ed_pem(
        &anchor.jwt_public_key_pem,
        Duration::from_secs(anchor.key_refresh_timeout_seconds),
    )
    .map_err(|_| AppError::Internal)?;

    let validator = TokenValidator::new(anchor, Arc::new(keys));
    let normalizer = IdentityNormalizer::new(anchor);
    let pipeline = AuthPipeline::new();

    Ok(Arc::new(Authenticator::new(pipeline, validator, normalizer)))
}
