//! Scope-or-role authorization decision.
//!
//! The rule is an OR across two independent claim families: a caller passes
//! with either a sufficient delegated scope or a sufficient application role.
//! Scope is checked first; first match wins. Machine-to-machine identities
//! (marked by a cloud-role claim) are pre-authorized at the trust boundary
//! and satisfy any requirement.

use std::collections::HashMap;

use crate::error::AppError;
use crate::services::auth::identity::{ClaimKind, Identity};

/// What a protected operation demands: one scope token OR one role token.
/// Constructed once at startup and shared read-only across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub scope: String,
    pub role: String,
}

impl Requirement {
    pub fn new(scope: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// The decision rule. Pure; no claim combination yields more than a single
/// Allow.
pub fn evaluate(identity: &Identity, requirement: &Requirement) -> Decision {
    if !identity.is_authenticated() {
        return Decision::Deny;
    }

    if let Some(scopes) = identity.find(ClaimKind::Scope) {
        if scopes.split_whitespace().any(|s| s == requirement.scope) {
            return Decision::Allow;
        }
    }

    if let Some(roles) = identity.find(ClaimKind::Role) {
        if roles.split_whitespace().any(|r| r == requirement.role) {
            return Decision::Allow;
        }
    }

    // Machine-trust marker: signed-request / invocation-context identities
    // carry no scopes or roles and are allowed unconditionally.
    if identity.find(ClaimKind::CloudRoleArn).is_some() {
        return Decision::Allow;
    }

    Decision::Deny
}

/// Operation names registered at startup.
pub mod operations {
    pub const SUBMIT_RESULT: &str = "submit_result";
    pub const READ_SUMMARY: &str = "read_summary";
    pub const CLEAR_RESULTS: &str = "clear_results";
}

/// Static operation-name -> requirement mapping, consulted by the HTTP
/// handlers. Built once at startup, never mutated.
#[derive(Debug)]
pub struct RequirementRegistry {
    requirements: HashMap<&'static str, Requirement>,
}

impl RequirementRegistry {
    pub fn with_defaults() -> Self {
        let mut requirements = HashMap::new();
        requirements.insert(
            operations::SUBMIT_RESULT,
            Requirement::new("Metrics.Submit", "Metrics.ReadWrite"),
        );
        requirements.insert(
            operations::CLEAR_RESULTS,
            Requirement::new("Metrics.Submit", "Metrics.ReadWrite"),
        );
        requirements.insert(
            operations::READ_SUMMARY,
            Requirement::new("Metrics.Read", "Metrics.ReadWrite"),
        );
        Self { requirements }
    }

    pub fn get(&self, operation: &str) -> Option<&Requirement> {
        self.requirements.get(operation)
    }

    /// Gatekeeper for handlers: anonymous callers get 401, authenticated
    /// callers failing the scope-or-role rule get 403.
    pub fn authorize(&self, operation: &'static str, identity: &Identity) -> Result<(), AppError> {
        let Some(requirement) = self.get(operation) else {
            // Operation was never registered; configuration bug, not a
            // caller problem.
            tracing::error!(operation, "no requirement registered for operation");
            return Err(AppError::Internal);
        };

        if !identity.is_authenticated() {
            return Err(AppError::Unauthorized);
        }

        match evaluate(identity, requirement) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                tracing::warn!(
                    operation,
                    scheme = identity.scheme(),
                    required_scope = %requirement.scope,
                    required_role = %requirement.role,
                    "authorization denied: no matching scope or role"
                );
                Err(AppError::Forbidden)
            }
        }
    }
}
