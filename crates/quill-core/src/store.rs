//! Store trait definitions for data access abstraction.
//!
//! All operations are async. Lookups return `Option` — absence is a
//! domain condition, not an error. Note operations are tenant-scoped
//! by construction; the note write and its usage-counter update are a
//! single logical unit inside the store.
//!
//! Two complete implementations exist in `quill-db`: the
//! SurrealDB-backed store and an in-memory fixture-backed store. The
//! auth core is generic over these traits and never branches on which
//! backend is active.

use std::future::Future;

use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::note::{CreateNote, Note, NoteFilter};
use crate::models::tenant::{CreateTenant, Subscription, Tenant, UsageField};
use crate::models::user::{CreateUser, Permissions, Role, Security, User};

pub trait TenantStore: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = CoreResult<Tenant>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = CoreResult<Option<Tenant>>> + Send;

    fn find_by_slug(&self, slug: &str) -> impl Future<Output = CoreResult<Option<Tenant>>> + Send;

    /// Persist a plan change resolved through `PlanPolicy`.
    fn update_plan(
        &self,
        id: Uuid,
        plan: crate::models::tenant::Plan,
        note_limit: i64,
        max_users: i64,
        subscription: Subscription,
    ) -> impl Future<Output = CoreResult<Tenant>> + Send;

    fn set_active(&self, id: Uuid, active: bool) -> impl Future<Output = CoreResult<()>> + Send;

    /// Add `amount` to a usage counter.
    fn increment_usage(
        &self,
        id: Uuid,
        field: UsageField,
        amount: i64,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Subtract `amount` from a usage counter, floor-clamped at 0.
    fn decrement_usage(
        &self,
        id: Uuid,
        field: UsageField,
        amount: i64,
    ) -> impl Future<Output = CoreResult<()>> + Send;
}

pub trait UserStore: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CoreResult<User>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = CoreResult<Option<User>>> + Send;

    /// Global (cross-tenant) lookup by lowercased email.
    fn find_by_email(&self, email: &str)
    -> impl Future<Output = CoreResult<Option<User>>> + Send;

    /// Persist login attempt counters, lock state, and last-login.
    fn update_security(
        &self,
        id: Uuid,
        security: Security,
    ) -> impl Future<Output = CoreResult<()>> + Send;

    /// Change role and stored permission flags. Promoting to admin
    /// must pass `Permissions::all()` — callers go through
    /// `effective_permissions` for checks either way.
    fn update_role(
        &self,
        id: Uuid,
        role: Role,
        permissions: Permissions,
    ) -> impl Future<Output = CoreResult<User>> + Send;

    fn set_active(&self, id: Uuid, active: bool) -> impl Future<Output = CoreResult<()>> + Send;
}

pub trait NoteStore: Send + Sync {
    /// Insert the note and increment the tenant's note counter as one
    /// unit of work. No creation without increment, no increment
    /// without creation.
    fn create_with_usage(
        &self,
        input: CreateNote,
    ) -> impl Future<Output = CoreResult<Note>> + Send;

    /// Soft-delete the note and decrement the tenant's note counter
    /// (floor-clamped) as one unit of work. Returns `false` when the
    /// note is missing or already deleted — no decrement happens then.
    fn soft_delete_with_usage(
        &self,
        tenant_id: Uuid,
        note_id: Uuid,
    ) -> impl Future<Output = CoreResult<bool>> + Send;

    fn find(&self, filter: NoteFilter) -> impl Future<Output = CoreResult<Vec<Note>>> + Send;

    /// Count of non-deleted notes; used to verify the usage-counter
    /// invariant, never in the hot path.
    fn count_active(&self, tenant_id: Uuid) -> impl Future<Output = CoreResult<u64>> + Send;
}
