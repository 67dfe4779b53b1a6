//! Services Module
//!
//! Read-through services that put the caches in front of their
//! authoritative sources.

mod auth;
mod credentials;
pub mod memory;
mod sources;

pub use auth::AuthService;
pub use credentials::CredentialService;
pub use sources::{CredentialSource, MembershipSource, TokenVerifier};
