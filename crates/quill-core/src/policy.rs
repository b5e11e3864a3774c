//! Plan policy and permission resolution.
//!
//! Plan-dependent defaults are resolved once, at tenant creation or
//! plan change, through [`PlanPolicy`] — not recomputed on every field
//! access.

use crate::models::tenant::{Plan, UNLIMITED_NOTES};
use crate::models::user::{Permissions, Role};

/// Defaults a plan grants a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPolicy {
    pub default_note_limit: i64,
    pub default_max_users: i64,
}

impl PlanPolicy {
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => Self {
                default_note_limit: 3,
                default_max_users: 5,
            },
            Plan::Pro => Self {
                default_note_limit: UNLIMITED_NOTES,
                default_max_users: 100,
            },
        }
    }
}

/// The single place where the admin-supersedes-flags rule lives.
/// Every permission check in the system goes through this function.
pub fn effective_permissions(role: Role, stored: Permissions) -> Permissions {
    match role {
        Role::Admin => Permissions::all(),
        Role::Member => stored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_policy_defaults() {
        let policy = PlanPolicy::for_plan(Plan::Free);
        assert_eq!(policy.default_note_limit, 3);
        assert_eq!(policy.default_max_users, 5);
    }

    #[test]
    fn pro_policy_is_unlimited() {
        let policy = PlanPolicy::for_plan(Plan::Pro);
        assert_eq!(policy.default_note_limit, UNLIMITED_NOTES);
        assert_eq!(policy.default_max_users, 100);
    }

    #[test]
    fn admin_overrides_stored_flags() {
        let none = Permissions {
            can_create_notes: false,
            can_edit_notes: false,
            can_delete_notes: false,
            can_share_notes: false,
            can_manage_users: false,
            can_manage_tenant: false,
        };
        assert_eq!(effective_permissions(Role::Admin, none), Permissions::all());
    }

    #[test]
    fn member_keeps_stored_flags() {
        let stored = Permissions::member_defaults();
        assert_eq!(effective_permissions(Role::Member, stored), stored);
        assert!(!effective_permissions(Role::Member, stored).can_manage_tenant);
    }
}
