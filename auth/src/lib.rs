//! Stateless authentication building blocks.
//!
//! Provides the reusable pieces of a bearer-token security pipeline:
//! - Password hashing (Argon2id)
//! - Signed access tokens with an explicit clock (JWT, HMAC)
//! - Authentication provider / manager seams
//! - Path-based authorization policy and the per-request security context
//!
//! Services supply their own user storage and adapt these pieces to it.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use auth::{Principal, Role, SigningAlgorithm, TokenCodec};
//! use chrono::{Duration, Utc};
//!
//! let codec = TokenCodec::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     SigningAlgorithm::Hs256,
//!     Duration::minutes(30),
//! );
//! let now = Utc::now();
//! let issued = codec.issue(&Principal::new("alice", [Role::User]), now).unwrap();
//! let claims = codec.validate(&issued.token, now).unwrap();
//! assert_eq!(claims.sub, "alice");
//! ```
//!
//! ## Authorization
//! ```
//! use auth::{Access, AuthorizationPolicy, AuthorizationRule, Decision, PathPattern, SecurityContext};
//!
//! let policy = AuthorizationPolicy::new(vec![AuthorizationRule::new(
//!     PathPattern::parse("/login").unwrap(),
//!     Access::Public,
//! )]);
//! let anonymous = SecurityContext::anonymous();
//! assert_eq!(policy.evaluate("/login", &anonymous), Decision::Allow);
//! assert_eq!(policy.evaluate("/me", &anonymous), Decision::Unauthenticated);
//! ```

pub mod access;
pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod principal;

// Re-export commonly used items
pub use access::Access;
pub use access::AuthorizationPolicy;
pub use access::AuthorizationRule;
pub use access::Decision;
pub use access::PathPattern;
pub use access::SecurityContext;
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationManager;
pub use authenticator::AuthenticationProvider;
pub use authenticator::ProviderManager;
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::SigningAlgorithm;
pub use jwt::TokenCodec;
pub use jwt::TokenError;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use principal::Credentials;
pub use principal::Principal;
pub use principal::Role;
