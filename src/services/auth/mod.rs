pub mod core;
pub mod evaluate;
pub mod extract;
pub mod factory;
pub mod identity;
pub mod keys;
pub mod scheme;
pub mod token;

pub use self::core::Authenticator;
pub use evaluate::{Decision, Requirement, RequirementRegistry, evaluate};
pub use factory::build_authenticator;
pub use identity::{Claim, ClaimKind, Identity};
pub use scheme::SchemeId;
