//! In-memory fixture-backed store.
//!
//! The second identity-provider implementation: development fixtures
//! and tests run against this store, selected by configuration — the
//! auth core never branches on which backend is active. All three
//! store traits are implemented over one mutex-guarded table set, so
//! the note-write + usage-increment pair is atomic by construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use quill_core::error::{CoreError, CoreResult};
use quill_core::models::note::{CreateNote, Note, NoteFilter};
use quill_core::models::tenant::{
    CreateTenant, Plan, Subscription, Tenant, TenantSettings, Usage, UsageField,
};
use quill_core::models::user::{CreateUser, Permissions, Role, Security, User};
use quill_core::policy::PlanPolicy;
use quill_core::store::{NoteStore, TenantStore, UserStore};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    tenants: HashMap<Uuid, Tenant>,
    users: HashMap<Uuid, User>,
    notes: HashMap<Uuid, Note>,
}

/// Fixture-backed store holding everything in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed pre-built fixtures, bypassing the creation paths.
    pub fn with_fixtures(tenants: Vec<Tenant>, users: Vec<User>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.lock().expect("store mutex poisoned");
            for tenant in tenants {
                tables.tenants.insert(tenant.id, tenant);
            }
            for user in users {
                tables.users.insert(user.id, user);
            }
        }
        store
    }

    fn lock(&self) -> CoreResult<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CoreError::Internal("store mutex poisoned".into()))
    }

    fn usage_field_mut(usage: &mut Usage, field: UsageField) -> &mut i64 {
        match field {
            UsageField::Notes => &mut usage.note_count,
            UsageField::Users => &mut usage.user_count,
            UsageField::Storage => &mut usage.storage_bytes,
        }
    }
}

impl TenantStore for MemoryStore {
    async fn create(&self, input: CreateTenant) -> CoreResult<Tenant> {
        let mut tables = self.lock()?;
        if tables.tenants.values().any(|t| t.slug == input.slug) {
            return Err(CoreError::AlreadyExists {
                entity: "tenant".into(),
            });
        }

        let policy = PlanPolicy::for_plan(input.plan);
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            slug: input.slug,
            name: input.name,
            plan: input.plan,
            note_limit: policy.default_note_limit,
            subscription: Subscription::active_from(now),
            usage: Usage::default(),
            settings: TenantSettings {
                allow_registration: true,
                max_users_per_tenant: policy.default_max_users,
            },
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Tenant>> {
        Ok(self.lock()?.tenants.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> CoreResult<Option<Tenant>> {
        Ok(self
            .lock()?
            .tenants
            .values()
            .find(|t| t.slug == slug)
            .cloned())
    }

    async fn update_plan(
        &self,
        id: Uuid,
        plan: Plan,
        note_limit: i64,
        max_users: i64,
        subscription: Subscription,
    ) -> CoreResult<Tenant> {
        let mut tables = self.lock()?;
        let tenant = tables.tenants.get_mut(&id).ok_or_else(|| CoreError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;
        tenant.plan = plan;
        tenant.note_limit = note_limit;
        tenant.settings.max_users_per_tenant = max_users;
        tenant.subscription = subscription;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if let Some(tenant) = tables.tenants.get_mut(&id) {
            tenant.is_active = active;
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_usage(&self, id: Uuid, field: UsageField, amount: i64) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if let Some(tenant) = tables.tenants.get_mut(&id) {
            *Self::usage_field_mut(&mut tenant.usage, field) += amount;
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn decrement_usage(&self, id: Uuid, field: UsageField, amount: i64) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if let Some(tenant) = tables.tenants.get_mut(&id) {
            let counter = Self::usage_field_mut(&mut tenant.usage, field);
            *counter = (*counter - amount).max(0);
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl UserStore for MemoryStore {
    async fn create(&self, input: CreateUser) -> CoreResult<User> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(CoreError::AlreadyExists {
                entity: "user".into(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            email: input.email,
            password_hash: input.password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            role: input.role,
            permissions: input.permissions,
            security: Security::default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_security(&self, id: Uuid, security: Security) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if let Some(user) = tables.users.get_mut(&id) {
            user.security = security;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_role(
        &self,
        id: Uuid,
        role: Role,
        permissions: Permissions,
    ) -> CoreResult<User> {
        let mut tables = self.lock()?;
        let user = tables.users.get_mut(&id).ok_or_else(|| CoreError::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        })?;
        user.role = role;
        user.permissions = permissions;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<()> {
        let mut tables = self.lock()?;
        if let Some(user) = tables.users.get_mut(&id) {
            user.is_active = active;
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl NoteStore for MemoryStore {
    async fn create_with_usage(&self, input: CreateNote) -> CoreResult<Note> {
        // Single lock scope: the insert and the counter bump cannot be
        // observed separately.
        let mut tables = self.lock()?;
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            user_id: input.user_id,
            title: input.title,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        tables.notes.insert(note.id, note.clone());
        if let Some(tenant) = tables.tenants.get_mut(&input.tenant_id) {
            tenant.usage.note_count += 1;
            tenant.updated_at = now;
        }
        Ok(note)
    }

    async fn soft_delete_with_usage(&self, tenant_id: Uuid, note_id: Uuid) -> CoreResult<bool> {
        let mut tables = self.lock()?;
        let now = Utc::now();

        let hit = match tables.notes.get_mut(&note_id) {
            Some(note) if note.tenant_id == tenant_id && !note.is_deleted => {
                note.is_deleted = true;
                note.updated_at = now;
                true
            }
            _ => false,
        };

        if hit {
            if let Some(tenant) = tables.tenants.get_mut(&tenant_id) {
                tenant.usage.note_count = (tenant.usage.note_count - 1).max(0);
                tenant.updated_at = now;
            }
        }
        Ok(hit)
    }

    async fn find(&self, filter: NoteFilter) -> CoreResult<Vec<Note>> {
        let tables = self.lock()?;
        let mut notes: Vec<Note> = tables
            .notes
            .values()
            .filter(|n| filter.tenant_id.is_none_or(|t| n.tenant_id == t))
            .filter(|n| filter.user_id.is_none_or(|u| n.user_id == u))
            .filter(|n| filter.include_deleted || !n.is_deleted)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }

    async fn count_active(&self, tenant_id: Uuid) -> CoreResult<u64> {
        let tables = self.lock()?;
        Ok(tables
            .notes
            .values()
            .filter(|n| n.tenant_id == tenant_id && !n.is_deleted)
            .count() as u64)
    }
}
