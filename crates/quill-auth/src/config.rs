//! Authentication configuration.

/// Configuration for the authentication core.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 JWT signing and verification.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub issuer: String,
    /// JWT audience (`aud` claim).
    pub audience: String,
    /// Access token lifetime in seconds (default: 604_800 = 7 days).
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 2_592_000 = 30 days).
    pub refresh_token_ttl_secs: u64,
    /// Consecutive failed login attempts before lockout (default: 5).
    pub max_login_attempts: u32,
    /// Lockout duration in seconds (default: 7_200 = 2 hours).
    pub lockout_duration_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Minimum password length for registration policy.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "quill".into(),
            audience: "quill-api".into(),
            access_token_ttl_secs: 604_800,
            refresh_token_ttl_secs: 2_592_000,
            max_login_attempts: 5,
            lockout_duration_secs: 7_200,
            pepper: None,
            min_password_length: 8,
        }
    }
}
