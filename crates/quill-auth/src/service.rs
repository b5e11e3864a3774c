//! Registration and login orchestration.
//!
//! The service owns the end-to-end flows: signup (tenant + founding
//! admin), login with lockout tracking, refresh, and logout. It is
//! generic over the store traits and carries no backend knowledge.
//!
//! Password hashing and verification run on the blocking thread pool —
//! Argon2id at the configured cost takes tens of milliseconds and must
//! not stall the async executor.

use chrono::Utc;
use quill_core::error::CoreError;
use quill_core::models::tenant::{
    CreateTenant, Plan, Subscription, SubscriptionStatus, Tenant, TenantView, UsageField,
};
use quill_core::models::user::{CreateUser, Permissions, Role, User, UserView};
use quill_core::policy::{PlanPolicy, effective_permissions};
use quill_core::slug::{is_valid_slug, slugify_name};
use quill_core::store::{TenantStore, UserStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::lockout;
use crate::password;
use crate::revocation::RevocationRegistry;
use crate::token::{self, TokenSubject, TokenType};

/// Input for the signup flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Display name of the new tenant; the slug is derived from it.
    pub tenant_name: String,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Successful registration or login result.
#[derive(Debug)]
pub struct AuthOutput {
    pub user: UserView,
    pub tenant: TenantView,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Successful refresh result — a new access token only, the refresh
/// token is not rotated.
#[derive(Debug)]
pub struct RefreshOutput {
    pub access_token: String,
    pub expires_in: u64,
}

/// Registration/login orchestrator.
pub struct AuthService<T, U> {
    tenants: T,
    users: U,
    config: AuthConfig,
    revocations: RevocationRegistry,
}

impl<T: TenantStore, U: UserStore> AuthService<T, U> {
    pub fn new(tenants: T, users: U, config: AuthConfig) -> Self {
        Self {
            tenants,
            users,
            config,
            revocations: RevocationRegistry::new(),
        }
    }

    /// Share a revocation registry with other components (the server
    /// keeps one registry per process).
    pub fn with_revocations(mut self, revocations: RevocationRegistry) -> Self {
        self.revocations = revocations;
        self
    }

    /// Sign up a new tenant with its founding admin user.
    ///
    /// The tenant starts on the free plan with the policy-default note
    /// limit; the first user is always an admin. Email uniqueness is
    /// global, matching the global login lookup.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthOutput, AuthError> {
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        if input.password.len() < self.config.min_password_length {
            return Err(AuthError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        let slug = slugify_name(&input.tenant_name);
        if !is_valid_slug(&slug) {
            return Err(AuthError::Validation(format!(
                "cannot derive a valid slug from tenant name {:?}",
                input.tenant_name
            )));
        }

        // Duplicate email rejects before the tenant slug is even
        // considered.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }
        if self.tenants.find_by_slug(&slug).await?.is_some() {
            return Err(AuthError::TenantExists);
        }

        let password_hash = self.hash_on_blocking_pool(input.password).await?;

        let tenant = self
            .tenants
            .create(CreateTenant {
                slug,
                name: input.tenant_name,
                plan: Plan::Free,
            })
            .await
            .map_err(map_duplicate(AuthError::TenantExists))?;

        let user = self
            .users
            .create(CreateUser {
                tenant_id: tenant.id,
                email,
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                role: Role::Admin,
                permissions: Permissions::all(),
            })
            .await
            .map_err(map_duplicate(AuthError::UserExists))?;

        // Not best-effort: an under-counted tenant would drift against
        // its member limit, so a failed bump fails the registration.
        self.tenants
            .increment_usage(tenant.id, UsageField::Users, 1)
            .await?;

        info!(tenant_id = %tenant.id, user_id = %user.id, slug = %tenant.slug, "Tenant registered");
        self.issue_pair(&user, &tenant)
    }

    /// Authenticate email + password and issue a token pair.
    ///
    /// Unknown email and wrong password produce the same generic
    /// error. The lock check runs before any password verification, so
    /// a locked account rejects even the correct password.
    pub async fn login(&self, input: LoginInput) -> Result<AuthOutput, AuthError> {
        let email = normalize_email(&input.email);
        let now = Utc::now();

        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if user.is_locked(now) {
            let until = user.security.lock_until.unwrap_or(now);
            return Err(AuthError::AccountLocked { until });
        }

        let valid = self
            .verify_on_blocking_pool(input.password, user.password_hash.clone())
            .await?;
        if !valid {
            let next = lockout::register_failure(&user.security, now, &self.config);
            if next.lock_until.is_some() && user.security.lock_until.is_none() {
                info!(user_id = %user.id, attempts = next.login_attempts, "Account locked");
            }
            // Counter persistence is best-effort; failing to record the
            // attempt must not change the response.
            if let Err(e) = self.users.update_security(user.id, next).await {
                warn!(user_id = %user.id, error = %e, "Failed to persist login failure");
            }
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let tenant = self
            .tenants
            .find_by_id(user.tenant_id)
            .await?
            .ok_or(AuthError::TenantInactive)?;
        if !tenant.is_active || tenant.subscription.status != SubscriptionStatus::Active {
            return Err(AuthError::TenantInactive);
        }

        let next = lockout::register_success(&user.security, now);
        if let Err(e) = self.users.update_security(user.id, next).await {
            warn!(user_id = %user.id, error = %e, "Failed to persist login success");
        }

        info!(user_id = %user.id, tenant_id = %tenant.id, "Login succeeded");
        self.issue_pair(&user, &tenant)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated. User and tenant are
    /// re-validated so a deactivation cuts refresh off immediately.
    /// Every token-level failure collapses into one stable code —
    /// callers never learn whether the token was malformed, expired,
    /// the wrong type, revoked, or orphaned.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutput, AuthError> {
        let claims = token::decode(refresh_token, &self.config)
            .map_err(|e| AuthError::RefreshTokenInvalid(e.to_string()))?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::RefreshTokenInvalid("not a refresh token".into()));
        }
        if let Some(jti) = &claims.jti {
            if self.revocations.is_revoked(jti) {
                return Err(AuthError::RefreshTokenInvalid("token revoked".into()));
            }
        }

        let user_id = claims
            .user_id()
            .map_err(|e| AuthError::RefreshTokenInvalid(e.to_string()))?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::RefreshTokenInvalid("user no longer exists".into()))?;
        if !user.is_active {
            return Err(AuthError::RefreshTokenInvalid("user is deactivated".into()));
        }

        let tenant = self
            .tenants
            .find_by_id(user.tenant_id)
            .await?
            .ok_or(AuthError::TenantInactive)?;
        if !tenant.is_active || tenant.subscription.status != SubscriptionStatus::Active {
            return Err(AuthError::TenantInactive);
        }
        let claimed_tenant = claims
            .tenant_uuid()
            .map_err(|e| AuthError::RefreshTokenInvalid(e.to_string()))?;
        if claimed_tenant != user.tenant_id {
            return Err(AuthError::RefreshTokenInvalid("tenant mismatch".into()));
        }

        let access_token = token::issue_access(&subject_for(&user, &tenant), &self.config)?;
        Ok(RefreshOutput {
            access_token,
            expires_in: self.config.access_token_ttl_secs,
        })
    }

    /// Revoke the presented refresh token.
    ///
    /// Idempotent and best-effort: an invalid or expired token is
    /// already unusable, so logout still succeeds. Outstanding access
    /// tokens stay valid until they expire.
    pub fn logout(&self, refresh_token: &str) {
        match token::decode(refresh_token, &self.config) {
            Ok(claims) if claims.token_type == TokenType::Refresh => {
                if let Some(jti) = &claims.jti {
                    let expires_at = chrono::DateTime::from_timestamp(claims.exp, 0)
                        .unwrap_or_else(Utc::now);
                    self.revocations.revoke(jti, expires_at);
                    info!(jti = %jti, "Refresh token revoked");
                }
            }
            Ok(_) => debug!("Logout presented a non-refresh token"),
            Err(e) => debug!(error = %e, "Logout presented an invalid token"),
        }
    }

    /// Change a tenant's plan, re-resolving limits through
    /// [`PlanPolicy`] (pro means unlimited notes, a downgrade clamps
    /// the limit back into the free range).
    pub async fn upgrade_tenant(&self, tenant_id: Uuid, plan: Plan) -> Result<TenantView, AuthError> {
        let mut tenant = self
            .tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| {
                AuthError::Store(CoreError::NotFound {
                    entity: "tenant".into(),
                    id: tenant_id.to_string(),
                })
            })?;

        let now = Utc::now();
        tenant.apply_plan(plan, now);
        let policy = PlanPolicy::for_plan(plan);
        let updated = self
            .tenants
            .update_plan(
                tenant.id,
                plan,
                tenant.note_limit,
                policy.default_max_users,
                Subscription::active_from(now),
            )
            .await?;

        info!(tenant_id = %updated.id, plan = ?plan, "Tenant plan changed");
        Ok(TenantView::from(&updated))
    }

    fn issue_pair(&self, user: &User, tenant: &Tenant) -> Result<AuthOutput, AuthError> {
        let subject = subject_for(user, tenant);
        let access_token = token::issue_access(&subject, &self.config)?;
        let refresh_token = token::issue_refresh(&subject, &self.config)?;
        Ok(AuthOutput {
            user: UserView::from(user),
            tenant: TenantView::from(tenant),
            access_token,
            refresh_token,
            expires_in: self.config.access_token_ttl_secs,
        })
    }

    async fn hash_on_blocking_pool(&self, plaintext: String) -> Result<String, AuthError> {
        let pepper = self.config.pepper.clone();
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext, pepper.as_deref()))
            .await
            .map_err(|e| AuthError::Crypto(format!("hash task failed: {e}")))?
    }

    async fn verify_on_blocking_pool(
        &self,
        plaintext: String,
        hash: String,
    ) -> Result<bool, AuthError> {
        let pepper = self.config.pepper.clone();
        tokio::task::spawn_blocking(move || {
            password::verify_password(&plaintext, &hash, pepper.as_deref())
        })
        .await
        .map_err(|e| AuthError::Crypto(format!("verify task failed: {e}")))
    }
}

fn subject_for(user: &User, tenant: &Tenant) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        email: user.email.clone(),
        tenant_id: user.tenant_id,
        tenant_slug: tenant.slug.clone(),
        role: user.role,
        permissions: effective_permissions(user.role, user.permissions),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = email.len() >= 3
        && email.len() <= 254
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && domain.contains('.')
        });
    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation("invalid email address".into()))
    }
}

/// Translate a store duplicate-key error into the flow-specific 409.
fn map_duplicate(conflict: AuthError) -> impl FnOnce(CoreError) -> AuthError {
    move |e| match e {
        CoreError::AlreadyExists { .. } => conflict,
        other => AuthError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("alice@nodot").is_err());
        assert!(validate_email("").is_err());
    }
}
