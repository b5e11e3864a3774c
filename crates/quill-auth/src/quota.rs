//! Plan quota enforcement for note creation.
//!
//! [`evaluate_quota`] is a pure read over a tenant snapshot.
//! [`NoteService`] couples the gate with the store's combined
//! note-write + usage-counter operations, so a denied request creates
//! nothing and a granted one can never leave the counter behind.

use quill_core::error::CoreResult;
use quill_core::models::note::{CreateNote, Note, NoteFilter};
use quill_core::models::tenant::{Plan, SubscriptionStatus, Tenant};
use quill_core::store::{NoteStore, TenantStore};
use tracing::info;
use uuid::Uuid;

use crate::error::AuthError;
use crate::resolver::Principal;

/// Structured detail for a quota denial, surfaced verbatim to clients.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaDenial {
    pub current_count: i64,
    pub limit: i64,
    pub plan: Plan,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum QuotaDecision {
    Granted,
    Denied(QuotaDenial),
}

impl QuotaDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Decide whether this tenant may create one more note. Pure — the
/// tenant snapshot is not mutated and no store access happens here.
pub fn evaluate_quota(tenant: &Tenant) -> QuotaDecision {
    if tenant.has_unlimited_notes() || tenant.usage.note_count < tenant.note_limit {
        return QuotaDecision::Granted;
    }

    let message = match tenant.plan {
        Plan::Free => format!(
            "Free plan is limited to {} notes. Upgrade to Pro for unlimited notes.",
            tenant.note_limit
        ),
        _ => format!(
            "Note limit reached ({}/{}).",
            tenant.usage.note_count, tenant.note_limit
        ),
    };

    QuotaDecision::Denied(QuotaDenial {
        current_count: tenant.usage.note_count,
        limit: tenant.note_limit,
        plan: tenant.plan,
        message,
    })
}

/// Note creation and deletion behind the quota gate.
pub struct NoteService<T, N> {
    tenants: T,
    notes: N,
}

impl<T: TenantStore, N: NoteStore> NoteService<T, N> {
    pub fn new(tenants: T, notes: N) -> Self {
        Self { tenants, notes }
    }

    /// Create a note for the principal's tenant, enforcing the plan
    /// quota against a fresh tenant snapshot. The store performs the
    /// insert and the counter increment as one unit.
    pub async fn create_note(
        &self,
        principal: &Principal,
        title: String,
    ) -> Result<Note, AuthError> {
        let tenant = self
            .tenants
            .find_by_id(principal.tenant_id)
            .await?
            .ok_or(AuthError::TenantInactive)?;
        if !tenant.is_active || tenant.subscription.status != SubscriptionStatus::Active {
            return Err(AuthError::TenantInactive);
        }

        match evaluate_quota(&tenant) {
            QuotaDecision::Granted => {}
            QuotaDecision::Denied(denial) => {
                info!(
                    tenant_id = %tenant.id,
                    current = denial.current_count,
                    limit = denial.limit,
                    "Note creation denied by quota"
                );
                return Err(AuthError::NoteLimitReached(denial));
            }
        }

        let note = self
            .notes
            .create_with_usage(CreateNote {
                tenant_id: principal.tenant_id,
                user_id: principal.user_id,
                title,
            })
            .await?;
        Ok(note)
    }

    /// Soft-delete a note in the principal's tenant, freeing quota.
    /// Deleting a missing, foreign, or already-deleted note is a 404.
    pub async fn delete_note(&self, principal: &Principal, note_id: Uuid) -> Result<(), AuthError> {
        let deleted = self
            .notes
            .soft_delete_with_usage(principal.tenant_id, note_id)
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(AuthError::NoteNotFound)
        }
    }

    /// List notes visible to the principal. The filter is re-scoped to
    /// the principal's tenant no matter what it asked for.
    pub async fn list_notes(
        &self,
        principal: &Principal,
        filter: NoteFilter,
    ) -> CoreResult<Vec<Note>> {
        self.notes.find(principal.scope(filter)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quill_core::models::tenant::{Subscription, TenantSettings, Usage};

    fn tenant(plan: Plan, note_count: i64, note_limit: i64) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: Uuid::new_v4(),
            slug: "acme-co".into(),
            name: "Acme Co".into(),
            plan,
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
    fn free_tenant_below_limit_is_granted() {
        assert!(evaluate_quota(&tenant(Plan::Free, 2, 3)).is_granted());
    }

    #[test]
    fn free_tenant_at_limit_is_denied_with_upgrade_hint() {
        let decision = evaluate_quota(&tenant(Plan::Free, 3, 3));
        let QuotaDecision::Denied(denial) = decision else {
            panic!("expected denial");
        };
        assert_eq!(denial.current_count, 3);
        assert_eq!(denial.limit, 3);
        assert_eq!(denial.plan, Plan::Free);
        assert!(denial.message.contains("Upgrade to Pro"));
    }

    #[test]
    fn over_limit_is_denied() {
        assert!(!evaluate_quota(&tenant(Plan::Free, 5, 3)).is_granted());
    }

    #[test]
    fn pro_tenant_is_always_granted() {
        assert!(evaluate_quota(&tenant(Plan::Pro, 1_000_000, -1)).is_granted());
    }

    #[test]
    fn evaluation_does_not_mutate_the_snapshot() {
        let snapshot = tenant(Plan::Free, 3, 3);
        let before = snapshot.usage.note_count;
        let _ = evaluate_quota(&snapshot);
        let _ = evaluate_quota(&snapshot);
        assert_eq!(snapshot.usage.note_count, before);
    }
}
