//! Note domain model.
//!
//! Only the fields relevant to quota accounting and tenant scoping
//! live here — the content model is handled elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    pub title: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNote {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
}

/// Filter for note queries. `tenant_id` is always overwritten by the
/// resolved principal's scope before the filter reaches the store —
/// see `Principal::scope` in the auth crate.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub include_deleted: bool,
}
