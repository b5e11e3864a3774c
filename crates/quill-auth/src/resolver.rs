//! Request authentication: token → [`Principal`].
//!
//! The resolver turns a bearer credential into a verified principal by
//! walking a fixed sequence of checks. User and tenant records are
//! re-read on every call — deactivating either takes effect on the
//! next request, not at token expiry.

use quill_core::models::note::NoteFilter;
use quill_core::models::tenant::SubscriptionStatus;
use quill_core::models::user::{Permissions, Role};
use quill_core::policy::effective_permissions;
use quill_core::store::{TenantStore, UserStore};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::ResolveError;
use crate::token::{self, TokenType};

/// Extract the token from an `Authorization` header value.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// A fully verified request identity.
///
/// Construction goes through [`AuthResolver::authenticate`] only, so
/// holding a `Principal` means every authentication check passed.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_slug: String,
    pub role: Role,
    /// Effective permissions (admins hold all flags).
    pub permissions: Permissions,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Force a note filter into this principal's tenant.
    ///
    /// The single tenant-scoping enforcement point: whatever
    /// `tenant_id` the filter arrived with is overwritten, so no query
    /// built from request input can cross tenants.
    pub fn scope(&self, mut filter: NoteFilter) -> NoteFilter {
        filter.tenant_id = Some(self.tenant_id);
        filter
    }
}

/// Resolves bearer tokens into principals against live store state.
pub struct AuthResolver<U, T> {
    users: U,
    tenants: T,
    config: AuthConfig,
}

impl<U: UserStore, T: TenantStore> AuthResolver<U, T> {
    pub fn new(users: U, tenants: T, config: AuthConfig) -> Self {
        Self {
            users,
            tenants,
            config,
        }
    }

    /// Authenticate a bearer credential.
    ///
    /// Checks run in order: credential present, token valid, token is
    /// an access token, user exists and is active, tenant exists and
    /// is active (including subscription status), and the token's
    /// tenant claim matches the user's current tenant.
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<Principal, ResolveError> {
        let token = credential.ok_or(ResolveError::NoToken)?;

        let claims = token::decode(token, &self.config)
            .map_err(|e| ResolveError::InvalidToken(e.to_string()))?;

        if claims.token_type != TokenType::Access {
            return Err(ResolveError::InvalidTokenType);
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| ResolveError::InvalidToken(format!("bad sub: {e}")))?;
        let claimed_tenant = Uuid::parse_str(&claims.tenant_id)
            .map_err(|e| ResolveError::InvalidToken(format!("bad tenantId: {e}")))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ResolveError::UserNotFound)?;
        if !user.is_active {
            return Err(ResolveError::UserInactive);
        }

        let tenant = self
            .tenants
            .find_by_id(user.tenant_id)
            .await?
            .ok_or(ResolveError::TenantInactive)?;
        if !tenant.is_active || tenant.subscription.status != SubscriptionStatus::Active {
            return Err(ResolveError::TenantInactive);
        }

        // A user moved between tenants invalidates every token issued
        // under the old tenant.
        if claimed_tenant != user.tenant_id {
            debug!(
                user_id = %user.id,
                token_tenant = %claimed_tenant,
                user_tenant = %user.tenant_id,
                "Token tenant claim disagrees with user record"
            );
            return Err(ResolveError::TenantMismatch);
        }

        Ok(Principal {
            user_id: user.id,
            tenant_id: user.tenant_id,
            tenant_slug: tenant.slug,
            role: user.role,
            permissions: effective_permissions(user.role, user.permissions),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("Bearer   spaced  "), Some("spaced"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Basic dXNlcjpwdw=="), None);
        assert_eq!(extract_bearer(""), None);
    }

    #[test]
    fn scope_overwrites_incoming_tenant() {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tenant_slug: "acme-co".into(),
            role: Role::Member,
            permissions: Permissions::member_defaults(),
        };

        let hostile = NoteFilter {
            tenant_id: Some(Uuid::new_v4()),
            user_id: None,
            include_deleted: false,
        };
        let scoped = principal.scope(hostile);
        assert_eq!(scoped.tenant_id, Some(principal.tenant_id));
    }
}
