//! Authentication and authorization module

pub mod guard;
pub mod middleware;
pub mod password;
pub mod token;

pub use guard::{require, AccessPolicy, Decision, Denial, RoleGuardLayer, RoleRule};
pub use middleware::{authentication_gate, extract_bearer_token, SecurityContext};
pub use password::{PasswordHasher, Verification};
pub use token::{Claims, SigningKey, TokenCodec, TokenError};
