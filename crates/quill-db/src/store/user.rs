//! SurrealDB implementation of [`UserStore`].
//!
//! Email lookups are global (system-wide unique index) — login does
//! not yet know the tenant. Permission flags are stored as a FLEXIBLE
//! object and round-tripped through `serde_json`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use quill_core::error::CoreResult;
use quill_core::models::user::{CreateUser, Permissions, Role, Security, User};
use quill_core::store::UserStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::connection::bounded;
use crate::error::StoreError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant_id: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    permissions: serde_json::Value,
    login_attempts: u32,
    lock_until: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    tenant_id: String,
    email: String,
    password_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    role: String,
    permissions: serde_json::Value,
    login_attempts: u32,
    lock_until: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<Role, StoreError> {
    match s {
        "admin" => Ok(Role::Admin),
        "member" => Ok(Role::Member),
        other => Err(StoreError::Query(format!("unknown role: {other}"))),
    }
}

fn role_to_string(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Member => "member",
    }
}

fn parse_permissions(value: serde_json::Value) -> Result<Permissions, StoreError> {
    serde_json::from_value(value)
        .map_err(|e| StoreError::Query(format!("invalid permissions object: {e}")))
}

fn permissions_to_value(permissions: Permissions) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(permissions)
        .map_err(|e| StoreError::Query(format!("permissions serialize: {e}")))
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, StoreError> {
        let tenant_id = Uuid::parse_str(&self.tenant_id)
            .map_err(|e| StoreError::Query(format!("invalid tenant UUID: {e}")))?;
        Ok(User {
            id,
            tenant_id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role: parse_role(&self.role)?,
            permissions: parse_permissions(self.permissions)?,
            security: Security {
                login_attempts: self.login_attempts,
                lock_until: self.lock_until,
                last_login: self.last_login,
            },
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, StoreError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| StoreError::Query(format!("invalid UUID: {e}")))?;
        let row = UserRow {
            tenant_id: self.tenant_id,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            permissions: self.permissions,
            login_attempts: self.login_attempts,
            lock_until: self.lock_until,
            last_login: self.last_login,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_user(id)
    }
}

/// SurrealDB implementation of the user store.
#[derive(Clone)]
pub struct SurrealUserStore<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealUserStore<C> {
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

impl<C: Connection> UserStore for SurrealUserStore<C> {
    async fn create(&self, input: CreateUser) -> CoreResult<User> {
        let result = bounded(self.timeout, async {
            let id = Uuid::new_v4();
            let id_str = id.to_string();
            let permissions = permissions_to_value(input.permissions)?;

            let result = self
                .db
                .query(
                    "CREATE type::record('user', $id) SET \
                     tenant_id = $tenant_id, \
                     email = $email, \
                     password_hash = $password_hash, \
                     first_name = $first_name, \
                     last_name = $last_name, \
                     role = $role, \
                     permissions = $permissions, \
                     login_attempts = 0, \
                     lock_until = NONE, \
                     last_login = NONE, \
                     is_active = true",
                )
                .bind(("id", id_str.clone()))
                .bind(("tenant_id", input.tenant_id.to_string()))
                .bind(("email", input.email))
                .bind(("password_hash", input.password_hash))
                .bind(("first_name", input.first_name))
                .bind(("last_name", input.last_name))
                .bind(("role", role_to_string(input.role).to_string()))
                .bind(("permissions", permissions))
                .await
                .map_err(StoreError::from)?;

            let mut result = result.check().map_err(|e| {
                let msg = e.to_string();
                if msg.contains("idx_user_email") {
                    StoreError::Duplicate {
                        entity: "user".into(),
                    }
                } else {
                    StoreError::Query(msg)
                }
            })?;

            let rows: Vec<UserRow> = result.take(0).map_err(StoreError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
                entity: "user".into(),
                id: id_str,
            })?;

            row.into_user(id)
        })
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        let result = bounded(self.timeout, async {
            let mut result = self
                .db
                .query("SELECT * FROM type::record('user', $id)")
                .bind(("id", id.to_string()))
                .await
                .map_err(StoreError::from)?;

            let rows: Vec<UserRow> = result.take(0).map_err(StoreError::from)?;
            rows.into_iter()
                .next()
                .map(|row| row.into_user(id))
                .transpose()
        })
        .await?;

        Ok(result)
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let email_owned = email.to_string();
        let result = bounded(self.timeout, async {
            let mut result = self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM user \
                     WHERE email = $email",
                )
                .bind(("email", email_owned))
                .await
                .map_err(StoreError::from)?;

            let rows: Vec<UserRowWithId> = result.take(0).map_err(StoreError::from)?;
            rows.into_iter()
                .next()
                .map(|row| row.try_into_user())
                .transpose()
        })
        .await?;

        Ok(result)
    }

    async fn update_security(&self, id: Uuid, security: Security) -> CoreResult<()> {
        bounded(self.timeout, async {
            self.db
                .query(
                    "UPDATE type::record('user', $id) SET \
                     login_attempts = $attempts, \
                     lock_until = $lock_until, \
                     last_login = $last_login, \
                     updated_at = time::now()",
                )
                .bind(("id", id.to_string()))
                .bind(("attempts", security.login_attempts))
                .bind(("lock_until", security.lock_until))
                .bind(("last_login", security.last_login))
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await?;

        Ok(())
    }

    async fn update_role(
        &self,
        id: Uuid,
        role: Role,
        permissions: Permissions,
    ) -> CoreResult<User> {
        let result = bounded(self.timeout, async {
            let id_str = id.to_string();
            let permissions = permissions_to_value(permissions)?;

            let result = self
                .db
                .query(
                    "UPDATE type::record('user', $id) SET \
                     role = $role, permissions = $permissions, \
                     updated_at = time::now()",
                )
                .bind(("id", id_str.clone()))
                .bind(("role", role_to_string(role).to_string()))
                .bind(("permissions", permissions))
                .await
                .map_err(StoreError::from)?;

            let mut result = result
                .check()
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let rows: Vec<UserRow> = result.take(0).map_err(StoreError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
                entity: "user".into(),
                id: id_str,
            })?;

            row.into_user(id)
        })
        .await?;

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<()> {
        bounded(self.timeout, async {
            self.db
                .query(
                    "UPDATE type::record('user', $id) SET \
                     is_active = $active, updated_at = time::now()",
                )
                .bind(("id", id.to_string()))
                .bind(("active", active))
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await?;

        Ok(())
    }
}
