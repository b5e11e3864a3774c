//! User domain model.
//!
//! A user belongs to exactly one tenant. Email is stored lowercase and
//! is unique across the whole system (see DESIGN.md on the uniqueness
//! policy).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

/// Independent permission flags. Admins implicitly hold all of them
/// regardless of the stored values — always check through
/// [`crate::policy::effective_permissions`], never against these flags
/// directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_create_notes: bool,
    pub can_edit_notes: bool,
    pub can_delete_notes: bool,
    pub can_share_notes: bool,
    pub can_manage_users: bool,
    pub can_manage_tenant: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            can_create_notes: true,
            can_edit_notes: true,
            can_delete_notes: true,
            can_share_notes: true,
            can_manage_users: true,
            can_manage_tenant: true,
        }
    }

    /// Default grants for an invited member.
    pub fn member_defaults() -> Self {
        Self {
            can_create_notes: true,
            can_edit_notes: true,
            can_delete_notes: true,
            can_share_notes: true,
            can_manage_users: false,
            can_manage_tenant: false,
        }
    }
}

/// Per-user login security state, mutated on every login attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Security {
    pub login_attempts: u32,
    pub lock_until: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Lowercased at every entry point.
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub permissions: Permissions,
    pub security: Security,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Locked iff an unexpired lock timestamp exists.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.security.lock_until, Some(until) if until > now)
    }
}

/// Fields required to create a new user. The password arrives already
/// hashed — hashing lives in the auth crate's password engine.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub tenant_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub permissions: Permissions,
}

/// Sanitized user view returned to clients. Never carries the
/// password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub permissions: Permissions,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            permissions: crate::policy::effective_permissions(user.role, user.permissions),
            last_login: user.security.last_login,
        }
    }
}
