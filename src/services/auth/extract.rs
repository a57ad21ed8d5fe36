//! Credential extractors.
//!
//! Each extractor recognizes one credential shape and either yields a
//! transient [`Credential`] or declines. They are pure functions of the
//! headers, composed once at startup into a fixed-priority pipeline; no
//! extractor verifies anything (validation and normalization happen later).

use axum::http::{HeaderMap, header};

use super::scheme::{
    self, BEARER_PREFIX, IAM_IDENTITY_HEADER, PLATFORM_CONTEXT_HEADER, SIGV4_ALGORITHM_PREFIX,
    SchemeId,
};

/// A recognized-but-unverified credential. Lives only between extraction and
/// normalization, then is consumed into an `Identity` or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer {
        token: String,
    },
    /// The signature itself is verified by the fronting platform; we only
    /// carry the identity payload it attached, if any.
    CloudSignature {
        identity_json: Option<String>,
    },
    InvocationContext {
        context_json: String,
    },
}

impl Credential {
    pub fn scheme(&self) -> SchemeId {
        match self {
            Credential::Bearer { .. } => SchemeId::Bearer,
            Credential::CloudSignature { .. } => SchemeId::CloudSignature,
            Credential::InvocationContext { .. } => SchemeId::InvocationContext,
        }
    }
}

pub trait CredentialExtractor: Send + Sync {
    fn scheme(&self) -> SchemeId;

    /// Yield a credential for this scheme, or decline (`None`). Declining is
    /// not an error; the pipeline simply moves on.
    fn try_extract(&self, headers: &HeaderMap) -> Option<Credential>;
}

pub struct BearerExtractor;

impl CredentialExtractor for BearerExtractor {
    fn scheme(&self) -> SchemeId {
        SchemeId::Bearer
    }

    fn try_extract(&self, headers: &HeaderMap) -> Option<Credential> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())?;
        let token = value.strip_prefix(BEARER_PREFIX)?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Credential::Bearer {
            token: token.to_string(),
        })
    }
}

pub struct CloudSignatureExtractor;

impl CredentialExtractor for CloudSignatureExtractor {
    fn scheme(&self) -> SchemeId {
        SchemeId::CloudSignature
    }

    fn try_extract(&self, headers: &HeaderMap) -> Option<Credential> {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())?;
        if !value.starts_with(SIGV4_ALGORITHM_PREFIX) {
            return None;
        }
        // The identity header is optional; absence falls back to the
        // configured default principal during normalization.
        let identity_json = headers
            .get(IAM_IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Some(Credential::CloudSignature { identity_json })
    }
}

pub struct InvocationContextExtractor;

impl CredentialExtractor for InvocationContextExtractor {
    fn scheme(&self) -> SchemeId {
        SchemeId::InvocationContext
    }

    fn try_extract(&self, headers: &HeaderMap) -> Option<Credential> {
        let value = headers.get(PLATFORM_CONTEXT_HEADER)?;
        // A present-but-unreadable header still yields a credential; the
        // normalizer decides between defaults and anonymous.
        let context_json = value.to_str().unwrap_or_default().to_string();
        Some(Credential::InvocationContext { context_json })
    }
}

/// Extractor pipeline, composed once at startup.
///
/// Scheme priority is owned by [`scheme::select`] alone; the pipeline runs
/// the one extractor matching the selected scheme, so at most one credential
/// is produced per request and the ordering invariant lives in exactly one
/// place.
pub struct AuthPipeline {
    extractors: Vec<Box<dyn CredentialExtractor>>,
}

impl AuthPipeline {
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(InvocationContextExtractor),
                Box::new(CloudSignatureExtractor),
                Box::new(BearerExtractor),
            ],
        }
    }

    pub fn extract(&self, headers: &HeaderMap) -> Option<Credential> {
        let selected = scheme::select(headers);
        if selected == SchemeId::NoCredential {
            return None;
        }
        self.extractors
            .iter()
            .find(|extractor| extractor.scheme() == selected)?
            .try_extract(headers)
    }
}

impl Default for AuthPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn bearer_extractor_strips_prefix() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(
            BearerExtractor.try_extract(&h),
            Some(Credential::Bearer {
                token: "abc.def.ghi".to_string()
            })
        );
    }

    #[test]
    fn bearer_extractor_declines_empty_token() {
        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(BearerExtractor.try_extract(&h), None);
    }

    #[test]
    fn bearer_extractor_declines_sigv4() {
        let h = headers(&[("authorization", "AWS4-HMAC-SHA256 Credential=AKIA")]);
        assert_eq!(BearerExtractor.try_extract(&h), None);
    }

    #[test]
    fn cloud_signature_extractor_carries_identity_header() {
        let h = headers(&[
            ("authorization", "AWS4-HMAC-SHA256 Credential=AKIA"),
            (
                "x-platform-iam-identity",
                r#"{"userArn":"arn:aws:iam::1:role/ci","accountId":"1"}"#,
            ),
        ]);
        match CloudSignatureExtractor.try_extract(&h) {
            Some(Credential::CloudSignature {
                identity_json: Some(json),
            }) => assert!(json.contains("userArn")),
            other => panic!("unexpected extraction: {other:?}"),
        }
    }

    #[test]
    fn cloud_signature_extractor_works_without_identity_header() {
        let h = headers(&[("authorization", "AWS4-HMAC-SHA256 Credential=AKIA")]);
        assert_eq!(
            CloudSignatureExtractor.try_extract(&h),
            Some(Credential::CloudSignature {
                identity_json: None
            })
        );
    }

    #[test]
    fn pipeline_prefers_invocation_context() {
        let h = headers(&[
            ("x-platform-context", r#"{"accountId":"1"}"#),
            ("authorization", "Bearer xyz"),
        ]);
        let pipeline = AuthPipeline::new();
        match pipeline.extract(&h) {
            Some(Credential::InvocationContext { context_json }) => {
                assert_eq!(context_json, r#"{"accountId":"1"}"#);
            }
            other => panic!("unexpected extraction: {other:?}"),
        }
    }

    #[test]
    fn pipeline_dispatches_to_the_selected_scheme() {
        let h = headers(&[
            ("authorization", "AWS4-HMAC-SHA256 Credential=AKIA"),
            (
                "x-platform-iam-identity",
                r#"{"userArn":"arn:aws:iam::1:role/ci","accountId":"1"}"#,
            ),
        ]);
        let pipeline = AuthPipeline::new();
        match pipeline.extract(&h) {
            Some(credential) => assert_eq!(credential.scheme(), SchemeId::CloudSignature),
            None => panic!("expected a cloud-signature credential"),
        }
    }

    #[test]
    fn pipeline_yields_nothing_for_bare_request() {
        let pipeline = AuthPipeline::new();
        assert_eq!(pipeline.extract(&HeaderMap::new()), None);
    }

    #[test]
    fn selected_scheme_with_unusable_credential_yields_nothing() {
        // select() picks bearer from the prefix, but the extractor declines
        // the empty token; the request ends up anonymous.
        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(AuthPipeline::new().extract(&h), None);
    }
}
