//! SurrealDB implementation of [`NoteStore`].
//!
//! The note write and the tenant usage-counter update run inside one
//! SurrealDB transaction — a created note is always reflected in
//! usage, and a soft-delete always carries its (clamped) decrement.

use std::time::Duration;

use chrono::{DateTime, Utc};
use quill_core::error::CoreResult;
use quill_core::models::note::{CreateNote, Note, NoteFilter};
use quill_core::store::NoteStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::connection::bounded;
use crate::error::StoreError;

#[derive(Debug, SurrealValue)]
struct NoteRow {
    tenant_id: String,
    user_id: String,
    title: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NoteRowWithId {
    record_id: String,
    tenant_id: String,
    user_id: String,
    title: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

impl NoteRow {
    fn into_note(self, id: Uuid) -> Result<Note, StoreError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| StoreError::Query(format!("invalid tenant UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| StoreError::Query(format!("invalid user UUID: {e}")))?;
        Ok(Note {
            id,
            tenant_id,
            user_id,
            title: self.title,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl NoteRowWithId {
    fn try_into_note(self) -> Result<Note, StoreError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| StoreError::Query(format!("invalid UUID: {e}")))?;
        let row = NoteRow {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            title: self.title,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_note(id)
    }
}

/// SurrealDB implementation of the note store.
#[derive(Clone)]
pub struct SurrealNoteStore<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealNoteStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<C: Connection> NoteStore for SurrealNoteStore<C> {
    async fn create_with_usage(&self, input: CreateNote) -> CoreResult<Note> {
        let result = bounded(self.timeout, async {
            let id = Uuid::new_v4();
            let id_str = id.to_string();

            let result = self
                .db
                .query(
                    "BEGIN TRANSACTION; \
                     CREATE type::record('note', $id) SET \
                     tenant_id = $tenant_id, user_id = $user_id, \
                     title = $title, is_deleted = false; \
                     UPDATE type::record('tenant', $tenant_id) SET \
                     usage_note_count += 1, updated_at = time::now(); \
                     COMMIT TRANSACTION;",
                )
                .bind(("id", id_str.clone()))
                .bind(("tenant_id", input.tenant_id.to_string()))
                .bind(("user_id", input.user_id.to_string()))
                .bind(("title", input.title))
                .await
                .map_err(StoreError::from)?;

            let mut result = result
                .check()
                .map_err(|e| StoreError::Query(e.to_string()))?;

            // Statements: 0 = BEGIN, 1 = CREATE, 2 = usage UPDATE, 3 = COMMIT.
            let rows: Vec<NoteRow> = result.take(1).map_err(StoreError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
                entity: "note".into(),
                id: id_str,
            })?;

            row.into_note(id)
        })
        .await?;

        Ok(result)
    }

    async fn soft_delete_with_usage(&self, tenant_id: Uuid, note_id: Uuid) -> CoreResult<bool> {
        let result = bounded(self.timeout, async {
            // The note UPDATE only matches a live note of this tenant;
            // the decrement amount is the match count (0 or 1), so a
            // miss leaves the counter untouched.
            let result = self
                .db
                .query(
                    "BEGIN TRANSACTION; \
                     LET $hit = (UPDATE type::record('note', $id) SET \
                     is_deleted = true, updated_at = time::now() \
                     WHERE tenant_id = $tenant_id AND is_deleted = false); \
                     UPDATE type::record('tenant', $tenant_id) SET \
                     usage_note_count = \
                     math::max([usage_note_count - array::len($hit), 0]), \
                     updated_at = time::now(); \
                     RETURN array::len($hit); \
                     COMMIT TRANSACTION;",
                )
                .bind(("id", note_id.to_string()))
                .bind(("tenant_id", tenant_id.to_string()))
                .await
                .map_err(StoreError::from)?;

            let mut result = result
                .check()
                .map_err(|e| StoreError::Query(e.to_string()))?;

            // Statements: 0 = BEGIN, 1 = LET, 2 = usage UPDATE,
            // 3 = RETURN, 4 = COMMIT.
            let hits: Option<i64> = result.take(3).map_err(StoreError::from)?;
            Ok(hits.unwrap_or(0) > 0)
        })
        .await?;

        Ok(result)
    }

    async fn find(&self, filter: NoteFilter) -> CoreResult<Vec<Note>> {
        let result = bounded(self.timeout, async {
            let mut conditions = Vec::new();
            if filter.tenant_id.is_some() {
                conditions.push("tenant_id = $tenant_id");
            }
            if filter.user_id.is_some() {
                conditions.push("user_id = $user_id");
            }
            if !filter.include_deleted {
                conditions.push("is_deleted = false");
            }

            let query = if conditions.is_empty() {
                "SELECT meta::id(id) AS record_id, * FROM note \
                 ORDER BY created_at ASC"
                    .to_string()
            } else {
                format!(
                    "SELECT meta::id(id) AS record_id, * FROM note \
                     WHERE {} ORDER BY created_at ASC",
                    conditions.join(" AND ")
                )
            };

            let mut builder = self.db.query(query);
            if let Some(tenant_id) = filter.tenant_id {
                builder = builder.bind(("tenant_id", tenant_id.to_string()));
            }
            if let Some(user_id) = filter.user_id {
                builder = builder.bind(("user_id", user_id.to_string()));
            }

            let mut result = builder.await.map_err(StoreError::from)?;
            let rows: Vec<NoteRowWithId> = result.take(0).map_err(StoreError::from)?;

            rows.into_iter()
                .map(|row| row.try_into_note())
                .collect::<Result<Vec<_>, StoreError>>()
        })
        .await?;

        Ok(result)
    }

    async fn count_active(&self, tenant_id: Uuid) -> CoreResult<u64> {
        let result = bounded(self.timeout, async {
            let mut result = self
                .db
                .query(
                    "SELECT count() AS total FROM note \
                     WHERE tenant_id = $tenant_id AND is_deleted = false \
                     GROUP ALL",
                )
                .bind(("tenant_id", tenant_id.to_string()))
                .await
                .map_err(StoreError::from)?;

            let rows: Vec<CountRow> = result.take(0).map_err(StoreError::from)?;
            Ok(rows.first().map(|r| r.total).unwrap_or(0))
        })
        .await?;

        Ok(result)
    }
}
