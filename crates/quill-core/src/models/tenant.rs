//! Tenant domain model.
//!
//! A tenant is an organization account: the unit of billing, quota,
//! and data isolation. Every user and note belongs to exactly one
//! tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::policy::PlanPolicy;

/// Sentinel note limit meaning "unlimited" (pro plan).
pub const UNLIMITED_NOTES: i64 = -1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Suspended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn active_from(now: DateTime<Utc>) -> Self {
        Self {
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: None,
        }
    }
}

/// Usage counters. Maintained exclusively through the store's
/// increment/decrement operations — never derived by counting on read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub note_count: i64,
    pub user_count: i64,
    pub storage_bytes: i64,
}

/// Which usage counter an increment/decrement targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageField {
    Notes,
    Users,
    Storage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    pub allow_registration: bool,
    pub max_users_per_tenant: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// URL-safe unique identifier, lowercase `[a-z0-9-]+`, 2–50 chars.
    pub slug: String,
    pub name: String,
    pub plan: Plan,
    /// Positive for free plans, [`UNLIMITED_NOTES`] for pro.
    pub note_limit: i64,
    pub subscription: Subscription,
    pub usage: Usage,
    pub settings: TenantSettings,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn has_unlimited_notes(&self) -> bool {
        self.note_limit == UNLIMITED_NOTES
    }

    /// Remaining note allowance, or `-1` for unlimited plans.
    pub fn remaining_notes(&self) -> i64 {
        if self.has_unlimited_notes() {
            UNLIMITED_NOTES
        } else {
            (self.note_limit - self.usage.note_count).max(0)
        }
    }

    pub fn can_create_notes(&self) -> bool {
        self.is_active
            && self.subscription.status == SubscriptionStatus::Active
            && (self.has_unlimited_notes() || self.usage.note_count < self.note_limit)
    }

    /// Switch plans, re-resolving limits from [`PlanPolicy`] so the
    /// plan/note_limit consistency invariant holds: pro forces
    /// unlimited, free clamps any out-of-range limit back to the
    /// policy default.
    pub fn apply_plan(&mut self, plan: Plan, now: DateTime<Utc>) {
        let policy = PlanPolicy::for_plan(plan);
        self.plan = plan;
        self.note_limit = match plan {
            Plan::Pro => UNLIMITED_NOTES,
            Plan::Free => {
                if (1..=10).contains(&self.note_limit) {
                    self.note_limit
                } else {
                    policy.default_note_limit
                }
            }
        };
        self.settings.max_users_per_tenant = policy.default_max_users;
        self.subscription = Subscription::active_from(now);
        self.updated_at = now;
    }
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone)]
pub struct CreateTenant {
    pub slug: String,
    pub name: String,
    pub plan: Plan,
}

/// Sanitized tenant view returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub plan: Plan,
    pub note_limit: i64,
    pub remaining_notes: i64,
    pub subscription_status: SubscriptionStatus,
}

impl From<&Tenant> for TenantView {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id,
            slug: tenant.slug.clone(),
            name: tenant.name.clone(),
            plan: tenant.plan,
            note_limit: tenant.note_limit,
            remaining_notes: tenant.remaining_notes(),
            subscription_status: tenant.subscription.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_tenant(note_count: i64, note_limit: i64) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: Uuid::new_v4(),
            slug: "acme-co".into(),
            name: "Acme Co".into(),
            plan: Plan::Free,
            note_limit,
            subscription: Subscription::active_from(now),
            usage: Usage {
                note_count,
                user_count: 1,
                storage_bytes: 0,
            },
            settings: TenantSettings {
                allow_registration: true,
                max_users_per_tenant: 5,
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn free_tenant_at_limit_cannot_create() {
        let tenant = free_tenant(3, 3);
        assert!(!tenant.can_create_notes());
        assert_eq!(tenant.remaining_notes(), 0);
    }

    #[test]
    fn free_tenant_below_limit_can_create() {
        let tenant = free_tenant(2, 3);
        assert!(tenant.can_create_notes());
        assert_eq!(tenant.remaining_notes(), 1);
    }

    #[test]
    fn pro_tenant_is_unlimited_regardless_of_count() {
        let mut tenant = free_tenant(1_000_000, 3);
        tenant.apply_plan(Plan::Pro, Utc::now());
        assert!(tenant.has_unlimited_notes());
        assert!(tenant.can_create_notes());
        assert_eq!(tenant.remaining_notes(), UNLIMITED_NOTES);
    }

    #[test]
    fn inactive_subscription_blocks_creation() {
        let mut tenant = free_tenant(0, 3);
        tenant.subscription.status = SubscriptionStatus::Suspended;
        assert!(!tenant.can_create_notes());
    }

    #[test]
    fn inactive_tenant_blocks_creation() {
        let mut tenant = free_tenant(0, 3);
        tenant.is_active = false;
        assert!(!tenant.can_create_notes());
    }

    #[test]
    fn downgrade_clamps_note_limit() {
        let mut tenant = free_tenant(0, 3);
        tenant.apply_plan(Plan::Pro, Utc::now());
        assert_eq!(tenant.note_limit, UNLIMITED_NOTES);

        tenant.apply_plan(Plan::Free, Utc::now());
        assert_eq!(tenant.note_limit, 3);
        assert_eq!(tenant.plan, Plan::Free);
    }

    #[test]
    fn remaining_notes_never_negative() {
        let tenant = free_tenant(5, 3);
        assert_eq!(tenant.remaining_notes(), 0);
    }
}
