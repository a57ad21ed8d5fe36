//! Canonical identity model and the normalizer that builds it.
//!
//! Every credential shape — validated token claims, signature-derived
//! principal, invocation-context principal — collapses into one `Identity`
//! so the evaluator never needs to know which channel a request arrived on.
//! Claim kinds are a closed enum; alias matching (`scp` vs. the long schema
//! URI, `roles` vs. its URI form) happens once here, not in the evaluator.

use serde::Deserialize;

use crate::config::AuthConfig;
use crate::services::auth::extract::Credential;
use crate::services::auth::scheme::SchemeId;
use crate::services::auth::token::AccessTokenClaims;

/// Fixed marker claimed by machine-to-machine execution contexts.
pub const EXECUTION_SOURCE_TRUSTED_PLATFORM: &str = "trusted-platform";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    Subject,
    /// Delegated (user-consented) permissions, space-separated token list.
    Scope,
    /// Application-level permissions, space-separated token list.
    Role,
    /// Machine-trust marker: presence means the request arrived through a
    /// pre-authenticated infrastructure channel.
    CloudRoleArn,
    CloudAccountId,
    ExecutionSource,
    AuthType,
}

impl ClaimKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimKind::Subject => "sub",
            ClaimKind::Scope => "scp",
            ClaimKind::Role => "roles",
            ClaimKind::CloudRoleArn => "cloudRoleArn",
            ClaimKind::CloudAccountId => "cloudAccountId",
            ClaimKind::ExecutionSource => "executionSource",
            ClaimKind::AuthType => "authType",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub kind: ClaimKind,
    pub value: String,
}

impl Claim {
    fn new(kind: ClaimKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Per-request caller identity. Built once during authentication, immutable
/// afterwards, dropped at end of request.
///
/// Invariant: unauthenticated implies an empty claim set; authenticated
/// implies at least one claim. The constructors are the only way to build
/// one, so the evaluator never sees a partial state.
#[derive(Debug, Clone)]
pub struct Identity {
    authenticated: bool,
    claims: Vec<Claim>,
    scheme: &'static str,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            claims: Vec::new(),
            scheme: SchemeId::NoCredential.as_str(),
        }
    }

    fn authenticated(scheme: SchemeId, claims: Vec<Claim>) -> Self {
        // Hard invariant, enforced in release builds too: the evaluator must
        // never see an authenticated identity with an empty claim set.
        assert!(!claims.is_empty(), "authenticated identity without claims");
        Self {
            authenticated: true,
            claims,
            scheme: scheme.as_str(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First claim of the given kind, if any.
    pub fn find(&self, kind: ClaimKind) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.value.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct IamIdentityPayload {
    #[serde(rename = "userArn")]
    user_arn: Option<String>,
    #[serde(rename = "accountId")]
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InvocationContextPayload {
    #[serde(rename = "accountId")]
    account_id: Option<String>,
    #[serde(rename = "invokedFunctionArn")]
    invoked_function_arn: Option<String>,
}

/// Builds the canonical [`Identity`] for each recognized credential.
#[derive(Debug, Clone)]
pub struct IdentityNormalizer {
    default_role_arn: String,
    default_account_id: String,
    fail_open: bool,
}

impl IdentityNormalizer {
    pub fn new(anchor: &AuthConfig) -> Self {
        Self {
            default_role_arn: anchor.default_role_arn.clone(),
            default_account_id: anchor.default_account_id.clone(),
            fail_open: anchor.context_fail_open,
        }
    }

    /// Bearer path: the validator's claim set, with the issuer's `roles`
    /// claim feeding `ClaimKind::Role` (the role-claim remapping).
    pub fn from_token_claims(&self, claims: AccessTokenClaims) -> Identity {
        let mut out = Vec::new();
        if let Some(sub) = claims.sub.filter(|s| !s.trim().is_empty()) {
            out.push(Claim::new(ClaimKind::Subject, sub));
        }
        if let Some(scope) = claims.scp.filter(|s| !s.trim().is_empty()) {
            out.push(Claim::new(ClaimKind::Scope, scope));
        }
        if let Some(roles) = claims.roles {
            let joined = roles.joined();
            if !joined.trim().is_empty() {
                out.push(Claim::new(ClaimKind::Role, joined));
            }
        }
        // Uniform across schemes; also keeps the claim set non-empty for
        // tokens that carry neither sub, scope nor roles.
        out.push(Claim::new(
            ClaimKind::AuthType,
            SchemeId::Bearer.as_str(),
        ));

        Identity::authenticated(SchemeId::Bearer, out)
    }

    /// Signed-request and invocation-context paths. These never carry a
    /// scope claim; the machine-trust marker (`CloudRoleArn`) is what the
    /// evaluator keys on.
    pub fn from_credential(&self, credential: Credential) -> Identity {
        match credential {
            Credential::CloudSignature { identity_json } => {
                let parsed = match identity_json.as_deref() {
                    None => None,
                    Some(raw) => match serde_json::from_str::<IamIdentityPayload>(raw) {
                        Ok(payload) => Some(payload),
                        Err(e) => {
                            if !self.fail_open {
                                tracing::warn!(
                                    error = %e,
                                    scheme = SchemeId::CloudSignature.as_str(),
                                    "malformed IAM identity payload; fail-open disabled, treating request as anonymous"
                                );
                                return Identity::anonymous();
                            }
                            tracing::warn!(
                                error = %e,
                                scheme = SchemeId::CloudSignature.as_str(),
                                "malformed IAM identity payload; falling back to default principal"
                            );
                            None
                        }
                    },
                };

                let (role_arn, account_id) = match parsed {
                    Some(payload) => (
                        payload
                            .user_arn
                            .unwrap_or_else(|| self.default_role_arn.clone()),
                        payload
                            .account_id
                            .unwrap_or_else(|| self.default_account_id.clone()),
                    ),
                    None => (
                        self.default_role_arn.clone(),
                        self.default_account_id.clone(),
                    ),
                };

                Identity::authenticated(
                    SchemeId::CloudSignature,
                    self.machine_claims(SchemeId::CloudSignature, role_arn, account_id),
                )
            }

            Credential::InvocationContext { context_json } => {
                let parsed = match serde_json::from_str::<InvocationContextPayload>(&context_json) {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        if !self.fail_open {
                            tracing::warn!(
                                error = %e,
                                scheme = SchemeId::InvocationContext.as_str(),
                                "malformed invocation context; fail-open disabled, treating request as anonymous"
                            );
                            return Identity::anonymous();
                        }
                        tracing::warn!(
                            error = %e,
                            scheme = SchemeId::InvocationContext.as_str(),
                            "malformed invocation context; falling back to default principal"
                        );
                        None
                    }
                };

                // Missing individual fields are normal (the platform does not
                // always populate both); they get defaults without a warning.
                let (role_arn, account_id) = match parsed {
                    Some(payload) => (
                        payload
                            .invoked_function_arn
                            .unwrap_or_else(|| self.default_role_arn.clone()),
                        payload
                            .account_id
                            .unwrap_or_else(|| self.default_account_id.clone()),
                    ),
                    None => (
                        self.default_role_arn.clone(),
                        self.default_account_id.clone(),
                    ),
                };

                Identity::authenticated(
                    SchemeId::InvocationContext,
                    self.machine_claims(SchemeId::InvocationContext, role_arn, account_id),
                )
            }

            // Bearer credentials go through the token validator, not here.
            Credential::Bearer { .. } => Identity::anonymous(),
        }
    }

    fn machine_claims(
        &self,
        scheme: SchemeId,
        role_arn: String,
        account_id: String,
    ) -> Vec<Claim> {
        vec![
            Claim::new(ClaimKind::CloudRoleArn, role_arn),
            Claim::new(ClaimKind::CloudAccountId, account_id),
            Claim::new(
                ClaimKind::ExecutionSource,
                EXECUTION_SOURCE_TRUSTED_PLATFORM,
            ),
            Claim::new(ClaimKind::AuthType, scheme.as_str()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::services::auth::token::StringOrList;

    const DEFAULT_ARN: &str = "arn:aws:iam::000000000000:role/metrics-api-default";

    fn anchor(fail_open: bool) -> AuthConfig {
        AuthConfig {
            issuer: "https://issuer.test".to_string(),
            audience: None,
            validate_issuer: true,
            validate_lifetime: true,
            token_leeway_seconds: 0,
            jwt_public_key_pem: String::new(),
            key_refresh_timeout_seconds: 5,
            default_role_arn: DEFAULT_ARN.to_string(),
            default_account_id: "000000000000".to_string(),
            context_fail_open: fail_open,
        }
    }

    fn token_claims(
        sub: Option<&str>,
        scp: Option<&str>,
        roles: Option<StringOrList>,
    ) -> AccessTokenClaims {
        AccessTokenClaims {
            iss: Some("https://issuer.test".to_string()),
            aud: serde_json::Value::Null,
            sub: sub.map(str::to_string),
            exp: Some(0),
            nbf: None,
            scp: scp.map(str::to_string),
            roles,
        }
    }

    #[test]
    #[should_panic(expected = "authenticated identity without claims")]
    fn authenticated_identity_requires_claims() {
        let _ = Identity::authenticated(SchemeId::Bearer, Vec::new());
    }

    #[test]
    fn anonymous_identity_has_no_claims() {
        let id = Identity::anonymous();
        assert!(!id.is_authenticated());
        assert!(id.claims().is_empty());
    }

    #[test]
    fn token_claims_become_scope_and_role_claims() {
        let normalizer = IdentityNormalizer::new(&anchor(true));
        let id = normalizer.from_token_claims(token_claims(
            Some("user-1"),
            Some("Metrics.Submit Metrics.Read"),
            Some(StringOrList::Many(vec!["Metrics.ReadWrite".to_string()])),
        ));

        assert!(id.is_authenticated());
        assert_eq!(id.scheme(), "bearer");
        assert_eq!(id.find(ClaimKind::Subject), Some("user-1"));
        assert_eq!(id.find(ClaimKind::Scope), Some("Metrics.Submit Metrics.Read"));
        assert_eq!(id.find(ClaimKind::Role), Some("Metrics.ReadWrite"));
        assert_eq!(id.find(ClaimKind::CloudRoleArn), None);
    }

    #[test]
    fn bare_token_still_yields_authenticated_identity() {
        let normalizer = IdentityNormalizer::new(&anchor(true));
        let id = normalizer.from_token_claims(token_claims(None, None, None));
        assert!(id.is_authenticated());
        assert_eq!(id.find(ClaimKind::AuthType), Some("bearer"));
        assert_eq!(id.find(ClaimKind::Scope), None);
    }

    #[test]
    fn cloud_signature_payload_maps_to_machine_claims() {
        let normalizer = IdentityNormalizer::new(&anchor(true));
        let id = normalizer.from_credential(Credential::CloudSignature {
            identity_json: Some(
                r#"{"userArn":"arn:aws:iam::140977286959:role/ci-deployer","accountId":"140977286959"}"#
                    .to_string(),
            ),
        });

        assert!(id.is_authenticated());
        assert_eq!(
            id.find(ClaimKind::CloudRoleArn),
            Some("arn:aws:iam::140977286959:role/ci-deployer")
        );
        assert_eq!(id.find(ClaimKind::CloudAccountId), Some("140977286959"));
        assert_eq!(
            id.find(ClaimKind::ExecutionSource),
            Some(EXECUTION_SOURCE_TRUSTED_PLATFORM)
        );
        assert_eq!(id.find(ClaimKind::AuthType), Some("cloud-signature"));
        assert_eq!(id.find(ClaimKind::Scope), None);
    }

    #[test]
    fn malformed_iam_identity_falls_back_to_default_principal() {
        let normalizer = IdentityNormalizer::new(&anchor(true));
        let id = normalizer.from_credential(Credential::CloudSignature {
            identity_json: Some("{not json".to_string()),
        });

        assert!(id.is_authenticated());
        assert_eq!(id.find(ClaimKind::CloudRoleArn), Some(DEFAULT_ARN));
    }

    #[test]
    fn malformed_iam_identity_denies_when_fail_open_disabled() {
        let normalizer = IdentityNormalizer::new(&anchor(false));
        let id = normalizer.from_credential(Credential::CloudSignature {
            identity_json: Some("{not json".to_string()),
        });
        assert!(!id.is_authenticated());
    }

    #[test]
    fn invocation_context_missing_fields_get_defaults() {
        let normalizer = IdentityNormalizer::new(&anchor(false));
        // Well-formed JSON with missing fields is not the fail-open case;
        // defaults apply even with fail-open disabled.
        let id = normalizer.from_credential(Credential::InvocationContext {
            context_json: r#"{"accountId":"123456789012"}"#.to_string(),
        });

        assert!(id.is_authenticated());
        assert_eq!(id.find(ClaimKind::CloudAccountId), Some("123456789012"));
        assert_eq!(id.find(ClaimKind::CloudRoleArn), Some(DEFAULT_ARN));
        assert_eq!(id.find(ClaimKind::AuthType), Some("invocation-context"));
    }

    #[test]
    fn malformed_invocation_context_falls_back_when_fail_open() {
        let normalizer = IdentityNormalizer::new(&anchor(true));
        let id = normalizer.from_credential(Credential::InvocationContext {
            context_json: "###".to_string(),
        });
        assert!(id.is_authenticated());
        assert_eq!(id.find(ClaimKind::CloudRoleArn), Some(DEFAULT_ARN));
    }
}
