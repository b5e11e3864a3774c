//! Quill Auth — the authentication and authorization core.
//!
//! This crate provides:
//! - Argon2id password hashing and verification ([`password`])
//! - Login-attempt tracking and account lockout ([`lockout`])
//! - JWT access/refresh token issuance and verification ([`token`])
//! - Refresh-token revocation registry ([`revocation`])
//! - Request authentication resolving a [`Principal`] ([`resolver`])
//! - Plan quota enforcement for note creation ([`quota`])
//! - Registration/login orchestration ([`service`])
//!
//! Everything is generic over the `quill-core` store traits — the auth
//! core never knows which backend is active.

pub mod config;
pub mod error;
pub mod lockout;
pub mod password;
pub mod quota;
pub mod resolver;
pub mod revocation;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::{AuthError, ResolveError};
pub use quota::{NoteService, QuotaDecision, QuotaDenial, evaluate_quota};
pub use resolver::{AuthResolver, Principal, extract_bearer};
pub use revocation::RevocationRegistry;
pub use service::{AuthOutput, AuthService, LoginInput, RefreshOutput, RegisterInput};
pub use token::{Claims, TokenType};
