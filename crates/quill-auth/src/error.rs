//! Error types for the authentication core.
//!
//! Every variant carries a stable machine-readable code and an HTTP
//! status — clients branch on codes, statuses never carry meaning
//! alone. Credential failures collapse into one generic variant so
//! responses cannot be used to enumerate which emails exist.

use chrono::{DateTime, Utc};
use quill_core::error::CoreError;
use thiserror::Error;

use crate::quota::QuotaDenial;

/// Errors from the registration/login orchestrator and note service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password — deliberately indistinct.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account is locked out after too many failed attempts.
    #[error("account locked until {until}")]
    AccountLocked { until: DateTime<Utc> },

    /// The user's tenant is deactivated or its subscription lapsed.
    #[error("tenant is inactive")]
    TenantInactive,

    /// A tenant with the derived slug already exists.
    #[error("tenant already exists")]
    TenantExists,

    /// A user with this email already exists.
    #[error("user already exists")]
    UserExists,

    /// Plan quota denied the note creation.
    #[error("{}", .0.message)]
    NoteLimitReached(QuotaDenial),

    /// Note missing, already deleted, or owned by another tenant.
    #[error("note not found")]
    NoteNotFound,

    /// Input failed validation before any store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Token failed signature, expiry, issuer, or audience checks.
    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// The refresh boundary rejected the presented token: failed
    /// verification, wrong type, revoked, or no longer matching a
    /// live account. One code for the whole boundary.
    #[error("invalid refresh token: {0}")]
    RefreshTokenInvalid(String),

    /// Cryptographic failure (hashing internals, key material).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Store-layer failure.
    #[error(transparent)]
    Store(#[from] CoreError),
}

impl AuthError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::TenantInactive => "TENANT_INACTIVE",
            Self::TenantExists => "TENANT_EXISTS",
            Self::UserExists => "USER_EXISTS",
            Self::NoteLimitReached(_) => "NOTE_LIMIT_REACHED",
            Self::NoteNotFound => "NOTE_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::TokenInvalid(_) => "INVALID_TOKEN",
            Self::RefreshTokenInvalid(_) => "INVALID_REFRESH_TOKEN",
            Self::Crypto(_) => "INTERNAL",
            Self::Store(CoreError::Unavailable(_)) => "STORE_UNAVAILABLE",
            Self::Store(CoreError::NotFound { .. }) => "NOT_FOUND",
            Self::Store(_) => "INTERNAL",
        }
    }

    /// HTTP status code this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::TokenInvalid(_) | Self::RefreshTokenInvalid(_) => 401,
            Self::AccountLocked { .. } => 423,
            Self::TenantInactive | Self::NoteLimitReached(_) => 403,
            Self::TenantExists | Self::UserExists => 409,
            Self::NoteNotFound => 404,
            Self::Validation(_) => 400,
            Self::Store(CoreError::Unavailable(_)) => 503,
            Self::Store(CoreError::NotFound { .. }) => 404,
            Self::Crypto(_) | Self::Store(_) => 500,
        }
    }

    /// Whether the client may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(CoreError::Unavailable(_)))
    }
}

/// Errors from the request auth resolver.
///
/// Every authentication failure maps to 401 with its own code — the
/// resolver never reveals more than which step rejected the request.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no credential presented")]
    NoToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A refresh token was presented where an access token is required.
    #[error("wrong token type")]
    InvalidTokenType,

    #[error("user not found")]
    UserNotFound,

    #[error("user is deactivated")]
    UserInactive,

    /// Tenant missing, deactivated, or subscription lapsed.
    #[error("tenant is inactive")]
    TenantInactive,

    /// The token's tenant claim disagrees with the user's record.
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error(transparent)]
    Store(#[from] CoreError),
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::InvalidTokenType => "INVALID_TOKEN_TYPE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UserInactive => "USER_INACTIVE",
            Self::TenantInactive => "TENANT_INACTIVE",
            Self::TenantMismatch => "TENANT_MISMATCH",
            Self::Store(CoreError::Unavailable(_)) => "STORE_UNAVAILABLE",
            Self::Store(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Store(CoreError::Unavailable(_)) => 503,
            Self::Store(_) => 500,
            _ => 401,
        }
    }
}
