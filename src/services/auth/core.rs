//! End-to-end authentication: extract → validate → normalize.

use axum::http::HeaderMap;

use crate::services::auth::extract::{AuthPipeline, Credential};
use crate::services::auth::identity::{Identity, IdentityNormalizer};
use crate::services::auth::token::TokenValidator;

/// One authenticator per process; every request borrows it read-only.
///
/// `authenticate` is total: whatever the headers look like, the result is a
/// well-formed [`Identity`]. No error escapes this boundary; a failed token
/// validation is logged and the request proceeds as anonymous.
pub struct Authenticator {
    pipeline: AuthPipeline,
    validator: TokenValidator,
    normalizer: IdentityNormalizer,
}

impl Authenticator {
    pub fn new(
        pipeline: AuthPipeline,
        validator: TokenValidator,
        normalizer: IdentityNormalizer,
    ) -> Self {
        Self {
            pipeline,
            validator,
            normalizer,
        }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Identity {
        let Some(credential) = self.pipeline.extract(headers) else {
            // No recognized credential shape. Not an error; the caller is
            // simply anonymous.
            return Identity::anonymous();
        };

        match credential {
            Credential::Bearer { token } => match self.validator.validate(&token) {
                Ok(claims) => self.normalizer.from_token_claims(claims),
                Err(err) => {
                    tracing::warn!(error = %err, "access token validation failed");
                    Identity::anonymous()
                }
            },
            other => self.normalizer.from_credential(other),
        }
    }
}
