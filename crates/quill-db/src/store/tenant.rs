//! SurrealDB implementation of [`TenantStore`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use quill_core::error::CoreResult;
use quill_core::models::tenant::{
    CreateTenant, Plan, Subscription, SubscriptionStatus, Tenant, TenantSettings, Usage,
    UsageField,
};
use quill_core::policy::PlanPolicy;
use quill_core::store::TenantStore;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::connection::bounded;
use crate::error::StoreError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    slug: String,
    name: String,
    plan: String,
    note_limit: i64,
    subscription_status: String,
    subscription_start_at: DateTime<Utc>,
    subscription_end_at: Option<DateTime<Utc>>,
    usage_note_count: i64,
    usage_user_count: i64,
    usage_storage_bytes: i64,
    allow_registration: bool,
    max_users_per_tenant: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    slug: String,
    name: String,
    plan: String,
    note_limit: i64,
    subscription_status: String,
    subscription_start_at: DateTime<Utc>,
    subscription_end_at: Option<DateTime<Utc>>,
    usage_note_count: i64,
    usage_user_count: i64,
    usage_storage_bytes: i64,
    allow_registration: bool,
    max_users_per_tenant: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_plan(s: &str) -> Result<Plan, StoreError> {
    match s {
        "free" => Ok(Plan::Free),
        "pro" => Ok(Plan::Pro),
        other => Err(StoreError::Query(format!("unknown plan: {other}"))),
    }
}

pub(crate) fn plan_to_string(plan: Plan) -> &'static str {
    match plan {
        Plan::Free => "free",
        Plan::Pro => "pro",
    }
}

fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus, StoreError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "inactive" => Ok(SubscriptionStatus::Inactive),
        "suspended" => Ok(SubscriptionStatus::Suspended),
        "cancelled" => Ok(SubscriptionStatus::Cancelled),
        other => Err(StoreError::Query(format!(
            "unknown subscription status: {other}"
        ))),
    }
}

fn subscription_status_to_string(status: SubscriptionStatus) -> &'static str {
    match status {
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Inactive => "inactive",
        SubscriptionStatus::Suspended => "suspended",
        SubscriptionStatus::Cancelled => "cancelled",
    }
}

fn usage_column(field: UsageField) -> &'static str {
    match field {
        UsageField::Notes => "usage_note_count",
        UsageField::Users => "usage_user_count",
        UsageField::Storage => "usage_storage_bytes",
    }
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, StoreError> {
        Ok(Tenant {
            id,
            slug: self.slug,
            name: self.name,
            plan: parse_plan(&self.plan)?,
            note_limit: self.note_limit,
            subscription: Subscription {
                status: parse_subscription_status(&self.subscription_status)?,
                start_date: self.subscription_start_at,
                end_date: self.subscription_end_at,
            },
            usage: Usage {
                note_count: self.usage_note_count,
                user_count: self.usage_user_count,
                storage_bytes: self.usage_storage_bytes,
            },
            settings: TenantSettings {
                allow_registration: self.allow_registration,
                max_users_per_tenant: self.max_users_per_tenant,
            },
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, StoreError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| StoreError::Query(format!("invalid UUID: {e}")))?;
        let row = TenantRow {
            slug: self.slug,
            name: self.name,
            plan: self.plan,
            note_limit: self.note_limit,
            subscription_status: self.subscription_status,
            subscription_start_at: self.subscription_start_at,
            subscription_end_at: self.subscription_end_at,
            usage_note_count: self.usage_note_count,
            usage_user_count: self.usage_user_count,
            usage_storage_bytes: self.usage_storage_bytes,
            allow_registration: self.allow_registration,
            max_users_per_tenant: self.max_users_per_tenant,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        row.into_tenant(id)
    }
}

/// SurrealDB implementation of the tenant store.
#[derive(Clone)]
pub struct SurrealTenantStore<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealTenantStore<C> {
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

impl<C: Connection> TenantStore for SurrealTenantStore<C> {
    async fn create(&self, input: CreateTenant) -> CoreResult<Tenant> {
        let result = bounded(self.timeout, async {
            let id = Uuid::new_v4();
            let id_str = id.to_string();
            let policy = PlanPolicy::for_plan(input.plan);
            let now = Utc::now();

            let result = self
                .db
                .query(
                    "CREATE type::record('tenant', $id) SET \
                     slug = $slug, name = $name, plan = $plan, \
                     note_limit = $note_limit, \
                     subscription_status = 'active', \
                     subscription_start_at = $start_at, \
                     subscription_end_at = NONE, \
                     usage_note_count = 0, \
                     usage_user_count = 0, \
                     usage_storage_bytes = 0, \
                     allow_registration = true, \
                     max_users_per_tenant = $max_users, \
                     is_active = true",
                )
                .bind(("id", id_str.clone()))
                .bind(("slug", input.slug))
                .bind(("name", input.name))
                .bind(("plan", plan_to_string(input.plan).to_string()))
                .bind(("note_limit", policy.default_note_limit))
                .bind(("start_at", now))
                .bind(("max_users", policy.default_max_users))
                .await
                .map_err(StoreError::from)?;

            let mut result = result.check().map_err(|e| {
                let msg = e.to_string();
                if msg.contains("idx_tenant_slug") {
                    StoreError::Duplicate {
                        entity: "tenant".into(),
                    }
                } else {
                    StoreError::Query(msg)
                }
            })?;

            let rows: Vec<TenantRow> = result.take(0).map_err(StoreError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
                entity: "tenant".into(),
                id: id_str,
            })?;

            row.into_tenant(id)
        })
        .await?;

        Ok(result)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Tenant>> {
        let result = bounded(self.timeout, async {
            let mut result = self
                .db
                .query("SELECT * FROM type::record('tenant', $id)")
                .bind(("id", id.to_string()))
                .await
                .map_err(StoreError::from)?;

            let rows: Vec<TenantRow> = result.take(0).map_err(StoreError::from)?;
            rows.into_iter()
                .next()
                .map(|row| row.into_tenant(id))
                .transpose()
        })
        .await?;

        Ok(result)
    }

    async fn find_by_slug(&self, slug: &str) -> CoreResult<Option<Tenant>> {
        let slug_owned = slug.to_string();
        let result = bounded(self.timeout, async {
            let mut result = self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM tenant \
                     WHERE slug = $slug",
                )
                .bind(("slug", slug_owned))
                .await
                .map_err(StoreError::from)?;

            let rows: Vec<TenantRowWithId> = result.take(0).map_err(StoreError::from)?;
            rows.into_iter()
                .next()
                .map(|row| row.try_into_tenant())
                .transpose()
        })
        .await?;

        Ok(result)
    }

    async fn update_plan(
        &self,
        id: Uuid,
        plan: Plan,
        note_limit: i64,
        max_users: i64,
        subscription: Subscription,
    ) -> CoreResult<Tenant> {
        let result = bounded(self.timeout, async {
            let id_str = id.to_string();

            let result = self
                .db
                .query(
                    "UPDATE type::record('tenant', $id) SET \
                     plan = $plan, note_limit = $note_limit, \
                     max_users_per_tenant = $max_users, \
                     subscription_status = $sub_status, \
                     subscription_start_at = $sub_start, \
                     subscription_end_at = $sub_end, \
                     updated_at = time::now()",
                )
                .bind(("id", id_str.clone()))
                .bind(("plan", plan_to_string(plan).to_string()))
                .bind(("note_limit", note_limit))
                .bind(("max_users", max_users))
                .bind((
                    "sub_status",
                    subscription_status_to_string(subscription.status).to_string(),
                ))
                .bind(("sub_start", subscription.start_date))
                .bind(("sub_end", subscription.end_date))
                .await
                .map_err(StoreError::from)?;

            let mut result = result
                .check()
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let rows: Vec<TenantRow> = result.take(0).map_err(StoreError::from)?;
            let row = rows.into_iter().next().ok_or_else(|| StoreError::NotFound {
                entity: "tenant".into(),
                id: id_str,
            })?;

            row.into_tenant(id)
        })
        .await?;

        Ok(result)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<()> {
        bounded(self.timeout, async {
            self.db
                .query(
                    "UPDATE type::record('tenant', $id) SET \
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

    async fn increment_usage(&self, id: Uuid, field: UsageField, amount: i64) -> CoreResult<()> {
        let column = usage_column(field);
        bounded(self.timeout, async {
            self.db
                .query(format!(
                    "UPDATE type::record('tenant', $id) SET \
                     {column} += $amount, updated_at = time::now()"
                ))
                .bind(("id", id.to_string()))
                .bind(("amount", amount))
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await?;

        Ok(())
    }

    async fn decrement_usage(&self, id: Uuid, field: UsageField, amount: i64) -> CoreResult<()> {
        let column = usage_column(field);
        bounded(self.timeout, async {
            self.db
                .query(format!(
                    "UPDATE type::record('tenant', $id) SET \
                     {column} = math::max([{column} - $amount, 0]), \
                     updated_at = time::now()"
                ))
                .bind(("id", id.to_string()))
                .bind(("amount", amount))
                .await
                .map_err(StoreError::from)?;
            Ok(())
        })
        .await?;

        Ok(())
    }
}
