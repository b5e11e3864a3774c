//! JWT issuance and verification (HS256 shared secret).
//!
//! Access and refresh tokens share one claim shape and differ in
//! lifetime and the `tokenType` claim. Decoding verifies signature,
//! expiry, issuer, and audience only — callers decide which token
//! type an operation accepts and must check `token_type` themselves.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use quill_core::models::user::{Permissions, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    pub email: String,
    #[serde(rename = "tenantId")]
    pub tenant_id: String,
    #[serde(rename = "tenantSlug")]
    pub tenant_slug: String,
    pub role: Role,
    /// Effective permissions at issuance time. Informational for
    /// clients — authorization decisions re-read the user record.
    pub permissions: Permissions,
    #[serde(rename = "tokenType")]
    pub token_type: TokenType,
    /// Unique token ID; present on refresh tokens only, where it keys
    /// the revocation registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad sub: {e}")))
    }

    pub fn tenant_uuid(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.tenant_id)
            .map_err(|e| AuthError::TokenInvalid(format!("bad tenantId: {e}")))
    }
}

/// Identity snapshot baked into a token pair.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
    pub tenant_id: Uuid,
    pub tenant_slug: String,
    pub role: Role,
    pub permissions: Permissions,
}

fn issue(
    subject: &TokenSubject,
    token_type: TokenType,
    ttl_secs: u64,
    jti: Option<String>,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.user_id.to_string(),
        email: subject.email.clone(),
        tenant_id: subject.tenant_id.to_string(),
        tenant_slug: subject.tenant_slug.clone(),
        role: subject.role,
        permissions: subject.permissions,
        token_type,
        jti,
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        iat: now,
        exp: now + ttl_secs as i64,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Issue a signed access token.
pub fn issue_access(subject: &TokenSubject, config: &AuthConfig) -> Result<String, AuthError> {
    issue(
        subject,
        TokenType::Access,
        config.access_token_ttl_secs,
        None,
        config,
    )
}

/// Issue a signed refresh token with a fresh random `jti`.
pub fn issue_refresh(subject: &TokenSubject, config: &AuthConfig) -> Result<String, AuthError> {
    issue(
        subject,
        TokenType::Refresh,
        config.refresh_token_ttl_secs,
        Some(Uuid::new_v4().to_string()),
        config,
    )
}

/// Decode and verify a token's signature, expiry, issuer, and
/// audience. Does not check `token_type`.
pub fn decode(token: &str, config: &AuthConfig) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

    jsonwebtoken::decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenInvalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::models::user::Permissions;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-do-not-use".into(),
            ..AuthConfig::default()
        }
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            tenant_id: Uuid::new_v4(),
            tenant_slug: "acme-co".into(),
            role: Role::Admin,
            permissions: Permissions::all(),
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let config = test_config();
        let subject = subject();

        let token = issue_access(&subject, &config).unwrap();
        let claims = decode(&token, &config).unwrap();

        assert_eq!(claims.sub, subject.user_id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.tenant_id, subject.tenant_id.to_string());
        assert_eq!(claims.tenant_slug, "acme-co");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.jti.is_none());
        assert_eq!(claims.exp - claims.iat, 604_800);
    }

    #[test]
    fn refresh_token_carries_unique_jti() {
        let config = test_config();
        let subject = subject();

        let t1 = issue_refresh(&subject, &config).unwrap();
        let t2 = issue_refresh(&subject, &config).unwrap();
        let c1 = decode(&t1, &config).unwrap();
        let c2 = decode(&t2, &config).unwrap();

        assert_eq!(c1.token_type, TokenType::Refresh);
        assert_eq!(c1.exp - c1.iat, 2_592_000);
        assert!(c1.jti.is_some());
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn decode_does_not_police_token_type() {
        let config = test_config();
        let token = issue_refresh(&subject(), &config).unwrap();
        // A refresh token decodes fine; callers reject on token_type.
        let claims = decode(&token, &config).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let subject = subject();
        let now = Utc::now().timestamp();
        // Expired an hour ago, well past any validation leeway.
        let claims = Claims {
            sub: subject.user_id.to_string(),
            email: subject.email.clone(),
            tenant_id: subject.tenant_id.to_string(),
            tenant_slug: subject.tenant_slug.clone(),
            role: subject.role,
            permissions: subject.permissions,
            token_type: TokenType::Access,
            jti: None,
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now - 7_200,
            exp: now - 3_600,
        };
        let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();

        let err = decode(&token, &config).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_access(&subject(), &config).unwrap();

        let other = AuthConfig {
            jwt_secret: "a-different-secret".into(),
            ..AuthConfig::default()
        };
        assert!(decode(&token, &other).is_err());
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let config = test_config();
        let token = issue_access(&subject(), &config).unwrap();

        let other = AuthConfig {
            audience: "someone-else".into(),
            ..test_config()
        };
        assert!(decode(&token, &other).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let config = test_config();
        assert!(decode("not.a.jwt", &config).is_err());
        assert!(decode("", &config).is_err());
    }

    #[test]
    fn claims_serialize_with_camel_case_names() {
        let config = test_config();
        let token = issue_refresh(&subject(), &config).unwrap();
        let claims = decode(&token, &config).unwrap();
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"tenantId\""));
        assert!(json.contains("\"tenantSlug\""));
        assert!(json.contains("\"tokenType\":\"refresh\""));
    }
}
