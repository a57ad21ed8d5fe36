//! Authentication scheme selection.
//!
//! One request is handled by exactly one scheme, chosen from header presence
//! alone (never the body). Priority is fixed: the platform-injected context
//! header wins over anything the caller can set on the wire, then the
//! signed-request shape, then a plain bearer token.

use axum::http::{HeaderMap, header};

/// Header injected by the hosting platform for in-platform invocations.
/// Only the hosting boundary can set it; a caller-supplied `Authorization`
/// header must never shadow it.
pub const PLATFORM_CONTEXT_HEADER: &str = "x-platform-context";

/// IAM identity payload the platform attaches to signature-verified requests.
pub const IAM_IDENTITY_HEADER: &str = "x-platform-iam-identity";

/// Algorithm tag that opens the `Authorization` value of a signed request.
pub const SIGV4_ALGORITHM_PREFIX: &str = "AWS4-HMAC-SHA256";

pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeId {
    InvocationContext,
    CloudSignature,
    Bearer,
    NoCredential,
}

impl SchemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeId::InvocationContext => "invocation-context",
            SchemeId::CloudSignature => "cloud-signature",
            SchemeId::Bearer => "bearer",
            SchemeId::NoCredential => "",
        }
    }
}

/// Pick the scheme for this request. Pure function of the headers.
pub fn select(headers: &HeaderMap) -> SchemeId {
    if headers.contains_key(PLATFORM_CONTEXT_HEADER) {
        return SchemeId::InvocationContext;
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match authorization {
        Some(v) if v.starts_with(SIGV4_ALGORITHM_PREFIX) => SchemeId::CloudSignature,
        Some(v) if v.starts_with(BEARER_PREFIX) => SchemeId::Bearer,
        _ => SchemeId::NoCredential,
    }
}
