//! End-to-end tests for the registration/login orchestrator and the
//! quota-gated note service, running against the in-memory store.

use chrono::{Duration, Utc};
use quill_auth::config::AuthConfig;
use quill_auth::error::AuthError;
use quill_auth::quota::NoteService;
use quill_auth::resolver::AuthResolver;
use quill_auth::service::{AuthService, LoginInput, RegisterInput};
use quill_core::error::{CoreError, CoreResult};
use quill_core::models::tenant::{CreateTenant, Plan, Subscription, Tenant, UsageField};
use quill_core::models::user::Role;
use quill_core::store::{NoteStore, TenantStore, UserStore};
use quill_db::MemoryStore;
use uuid::Uuid;

fn config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".into(),
        ..AuthConfig::default()
    }
}

fn service(store: &MemoryStore) -> AuthService<MemoryStore, MemoryStore> {
    AuthService::new(store.clone(), store.clone(), config())
}

fn register_input(email: &str, tenant_name: &str) -> RegisterInput {
    RegisterInput {
        email: email.into(),
        password: "correct horse battery".into(),
        first_name: Some("Alice".into()),
        last_name: None,
        tenant_name: tenant_name.into(),
    }
}

#[tokio::test]
async fn register_creates_tenant_and_founding_admin() {
    let store = MemoryStore::new();
    let auth = service(&store);

    let out = auth
        .register(register_input("Alice@Example.com", "Acme Co"))
        .await
        .unwrap();

    // Email normalized, first user is admin, slug derived from name.
    assert_eq!(out.user.email, "alice@example.com");
    assert_eq!(out.user.role, Role::Admin);
    assert_eq!(out.tenant.slug, "acme-co");
    assert_eq!(out.tenant.plan, Plan::Free);
    assert_eq!(out.tenant.note_limit, 3);
    assert!(!out.access_token.is_empty());
    assert!(!out.refresh_token.is_empty());

    // Founding admin counts toward tenant usage.
    let tenant = TenantStore::find_by_id(&store, out.tenant.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tenant.usage.user_count, 1);
}

#[tokio::test]
async fn duplicate_tenant_name_conflicts() {
    let store = MemoryStore::new();
    let auth = service(&store);

    auth.register(register_input("a@example.com", "Acme Co"))
        .await
        .unwrap();
    // Different casing, same derived slug.
    let err = auth
        .register(register_input("b@example.com", "ACME CO"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TenantExists));
    assert_eq!(err.code(), "TENANT_EXISTS");
    assert_eq!(err.status(), 409);
}

#[tokio::test]
async fn duplicate_email_conflicts_across_tenants() {
    let store = MemoryStore::new();
    let auth = service(&store);

    auth.register(register_input("same@example.com", "First Co"))
        .await
        .unwrap();
    let err = auth
        .register(register_input("same@example.com", "Second Co"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserExists));
    assert_eq!(err.status(), 409);
}

#[tokio::test]
async fn short_password_is_rejected_before_any_write() {
    let store = MemoryStore::new();
    let auth = service(&store);

    let err = auth
        .register(RegisterInput {
            password: "short".into(),
            ..register_input("a@example.com", "Acme Co")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
    assert!(TenantStore::find_by_slug(&store, "acme-co")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_roundtrip() {
    let store = MemoryStore::new();
    let auth = service(&store);
    auth.register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    let out = auth
        .login(LoginInput {
            email: " ALICE@example.com ".into(),
            password: "correct horse battery".into(),
        })
        .await
        .unwrap();
    assert_eq!(out.user.email, "alice@example.com");

    // Success resets the attempt counter and stamps last_login.
    let user = UserStore::find_by_email(&store, "alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.security.login_attempts, 0);
    assert!(user.security.last_login.is_some());
}

#[tokio::test]
async fn unknown_email_and_wrong_password_are_indistinct() {
    let store = MemoryStore::new();
    let auth = service(&store);
    auth.register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    let unknown = auth
        .login(LoginInput {
            email: "nobody@example.com".into(),
            password: "whatever".into(),
        })
        .await
        .unwrap_err();
    let wrong = auth
        .login(LoginInput {
            email: "alice@example.com".into(),
            password: "wrong password".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(unknown.code(), "INVALID_CREDENTIALS");
    assert_eq!(wrong.code(), "INVALID_CREDENTIALS");
    assert_eq!(unknown.status(), 401);
    assert_eq!(wrong.status(), 401);
}

#[tokio::test]
async fn fifth_failure_locks_the_account_for_two_hours() {
    let store = MemoryStore::new();
    let auth = service(&store);
    auth.register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    for _ in 0..5 {
        let err = auth
            .login(LoginInput {
                email: "alice@example.com".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CREDENTIALS");
    }

    // Locked now — even the correct password is rejected with 423.
    let err = auth
        .login(LoginInput {
            email: "alice@example.com".into(),
            password: "correct horse battery".into(),
        })
        .await
        .unwrap_err();
    let AuthError::AccountLocked { until } = err else {
        panic!("expected ACCOUNT_LOCKED, got {err:?}");
    };
    let remaining = until - Utc::now();
    assert!(remaining > Duration::minutes(115) && remaining <= Duration::hours(2));

    let locked_err = AuthError::AccountLocked { until };
    assert_eq!(locked_err.code(), "ACCOUNT_LOCKED");
    assert_eq!(locked_err.status(), 423);
}

#[tokio::test]
async fn inactive_tenant_blocks_login_with_403() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    TenantStore::set_active(&store, out.tenant.id, false)
        .await
        .unwrap();

    let err = auth
        .login(LoginInput {
            email: "alice@example.com".into(),
            password: "correct horse battery".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TenantInactive));
    assert_eq!(err.code(), "TENANT_INACTIVE");
    assert_eq!(err.status(), 403);
}

#[tokio::test]
async fn refresh_mints_a_new_access_token() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    let refreshed = auth.refresh(&out.refresh_token).await.unwrap();
    assert!(!refreshed.access_token.is_empty());
    assert_eq!(refreshed.expires_in, 604_800);

    // The minted token authenticates.
    let resolver = AuthResolver::new(store.clone(), store.clone(), config());
    let principal = resolver
        .authenticate(Some(&refreshed.access_token))
        .await
        .unwrap();
    assert_eq!(principal.user_id, out.user.id);
}

#[tokio::test]
async fn access_token_cannot_be_used_for_refresh() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    let err = auth.refresh(&out.access_token).await.unwrap_err();
    assert!(matches!(err, AuthError::RefreshTokenInvalid(_)));
    assert_eq!(err.code(), "INVALID_REFRESH_TOKEN");
    assert_eq!(err.status(), 401);
}

#[tokio::test]
async fn refresh_failures_share_one_stable_code() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    // Garbage, wrong-type, and revoked tokens are indistinct at the
    // refresh boundary.
    let garbage = auth.refresh("not.a.jwt").await.unwrap_err();
    assert_eq!(garbage.code(), "INVALID_REFRESH_TOKEN");

    let wrong_type = auth.refresh(&out.access_token).await.unwrap_err();
    assert_eq!(wrong_type.code(), "INVALID_REFRESH_TOKEN");

    auth.logout(&out.refresh_token);
    let revoked = auth.refresh(&out.refresh_token).await.unwrap_err();
    assert_eq!(revoked.code(), "INVALID_REFRESH_TOKEN");

    // A deleted user orphans the token the same way.
    let other = auth
        .register(register_input("bob@example.com", "Other Co"))
        .await
        .unwrap();
    UserStore::set_active(&store, other.user.id, false)
        .await
        .unwrap();
    let orphaned = auth.refresh(&other.refresh_token).await.unwrap_err();
    assert_eq!(orphaned.code(), "INVALID_REFRESH_TOKEN");
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    auth.logout(&out.refresh_token);
    let err = auth.refresh(&out.refresh_token).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_REFRESH_TOKEN");

    // Logout with garbage is a quiet no-op.
    auth.logout("not-a-token");
}

#[tokio::test]
async fn free_tenant_hits_the_note_limit_and_recovers_by_deleting() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    let resolver = AuthResolver::new(store.clone(), store.clone(), config());
    let principal = resolver
        .authenticate(Some(&out.access_token))
        .await
        .unwrap();
    let notes = NoteService::new(store.clone(), store.clone());

    let mut created = Vec::new();
    for i in 0..3 {
        created.push(
            notes
                .create_note(&principal, format!("note {i}"))
                .await
                .unwrap(),
        );
    }

    // Fourth create is denied with structured quota detail.
    let err = notes
        .create_note(&principal, "one too many".into())
        .await
        .unwrap_err();
    let AuthError::NoteLimitReached(denial) = &err else {
        panic!("expected NOTE_LIMIT_REACHED, got {err:?}");
    };
    assert_eq!(denial.current_count, 3);
    assert_eq!(denial.limit, 3);
    assert_eq!(denial.plan, Plan::Free);
    assert!(denial.message.contains("Upgrade to Pro"));
    assert_eq!(err.code(), "NOTE_LIMIT_REACHED");

    // Nothing was created by the denied request.
    assert_eq!(NoteStore::count_active(&store, principal.tenant_id).await.unwrap(), 3);

    // Deleting one frees quota for exactly one more.
    notes.delete_note(&principal, created[0].id).await.unwrap();
    notes
        .create_note(&principal, "fits again".into())
        .await
        .unwrap();
    let err = notes
        .create_note(&principal, "still one too many".into())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOTE_LIMIT_REACHED");
}

#[tokio::test]
async fn pro_upgrade_lifts_the_note_limit() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let out = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap();

    let resolver = AuthResolver::new(store.clone(), store.clone(), config());
    let principal = resolver
        .authenticate(Some(&out.access_token))
        .await
        .unwrap();
    let notes = NoteService::new(store.clone(), store.clone());

    for i in 0..3 {
        notes
            .create_note(&principal, format!("note {i}"))
            .await
            .unwrap();
    }
    assert!(notes.create_note(&principal, "denied".into()).await.is_err());

    let view = auth.upgrade_tenant(out.tenant.id, Plan::Pro).await.unwrap();
    assert_eq!(view.plan, Plan::Pro);
    assert_eq!(view.note_limit, -1);

    // Creation now sails past the old limit.
    for i in 0..10 {
        notes
            .create_note(&principal, format!("pro note {i}"))
            .await
            .unwrap();
    }
    assert_eq!(
        NoteStore::count_active(&store, principal.tenant_id).await.unwrap(),
        13
    );
}

#[tokio::test]
async fn deleting_a_foreign_note_is_a_miss() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let a = auth
        .register(register_input("a@example.com", "Tenant A"))
        .await
        .unwrap();
    let b = auth
        .register(register_input("b@example.com", "Tenant B"))
        .await
        .unwrap();

    let resolver = AuthResolver::new(store.clone(), store.clone(), config());
    let alice = resolver.authenticate(Some(&a.access_token)).await.unwrap();
    let bob = resolver.authenticate(Some(&b.access_token)).await.unwrap();
    let notes = NoteService::new(store.clone(), store.clone());

    let note = notes.create_note(&alice, "private".into()).await.unwrap();

    let err = notes.delete_note(&bob, note.id).await.unwrap_err();
    assert_eq!(err.code(), "NOTE_NOT_FOUND");
    assert_eq!(err.status(), 404);
    // Alice's note and counter are untouched.
    assert_eq!(NoteStore::count_active(&store, alice.tenant_id).await.unwrap(), 1);
}

#[tokio::test]
async fn note_listing_is_tenant_scoped() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let a = auth
        .register(register_input("a@example.com", "Tenant A"))
        .await
        .unwrap();
    let b = auth
        .register(register_input("b@example.com", "Tenant B"))
        .await
        .unwrap();

    let resolver = AuthResolver::new(store.clone(), store.clone(), config());
    let alice = resolver.authenticate(Some(&a.access_token)).await.unwrap();
    let bob = resolver.authenticate(Some(&b.access_token)).await.unwrap();
    let notes = NoteService::new(store.clone(), store.clone());

    notes.create_note(&alice, "alice's".into()).await.unwrap();
    notes.create_note(&bob, "bob's".into()).await.unwrap();

    // Even a filter pinned to Alice's tenant returns only Bob's notes
    // when Bob asks.
    let listed = notes
        .list_notes(
            &bob,
            quill_core::models::note::NoteFilter {
                tenant_id: Some(alice.tenant_id),
                user_id: None,
                include_deleted: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "bob's");
}

#[tokio::test]
async fn duplicate_email_wins_over_duplicate_tenant_name() {
    let store = MemoryStore::new();
    let auth = service(&store);

    auth.register(register_input("same@example.com", "Acme Co"))
        .await
        .unwrap();

    // Both the email and the derived slug collide; the email check
    // runs first so the caller learns about the account, not the name.
    let err = auth
        .register(register_input("same@example.com", "acme co"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserExists));
    assert_eq!(err.code(), "USER_EXISTS");
}

/// Tenant store whose usage-counter writes always fail, for proving
/// registration does not swallow a lost founding-admin count.
#[derive(Clone)]
struct CounterFailingTenantStore {
    inner: MemoryStore,
}

impl TenantStore for CounterFailingTenantStore {
    async fn create(&self, input: CreateTenant) -> CoreResult<Tenant> {
        TenantStore::create(&self.inner, input).await
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Tenant>> {
        TenantStore::find_by_id(&self.inner, id).await
    }

    async fn find_by_slug(&self, slug: &str) -> CoreResult<Option<Tenant>> {
        TenantStore::find_by_slug(&self.inner, slug).await
    }

    async fn update_plan(
        &self,
        id: Uuid,
        plan: Plan,
        note_limit: i64,
        max_users: i64,
        subscription: Subscription,
    ) -> CoreResult<Tenant> {
        self.inner
            .update_plan(id, plan, note_limit, max_users, subscription)
            .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> CoreResult<()> {
        TenantStore::set_active(&self.inner, id, active).await
    }

    async fn increment_usage(&self, _id: Uuid, _field: UsageField, _amount: i64) -> CoreResult<()> {
        Err(CoreError::Unavailable("usage counter write failed".into()))
    }

    async fn decrement_usage(&self, id: Uuid, field: UsageField, amount: i64) -> CoreResult<()> {
        self.inner.decrement_usage(id, field, amount).await
    }
}

#[tokio::test]
async fn failed_member_count_bump_fails_registration() {
    let store = MemoryStore::new();
    let tenants = CounterFailingTenantStore {
        inner: store.clone(),
    };
    let auth = AuthService::new(tenants, store.clone(), config());

    let err = auth
        .register(register_input("alice@example.com", "Acme Co"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "STORE_UNAVAILABLE");
    assert_eq!(err.status(), 503);
}

#[tokio::test]
async fn upgrade_of_unknown_tenant_is_not_found() {
    let store = MemoryStore::new();
    let auth = service(&store);
    let err = auth
        .upgrade_tenant(Uuid::new_v4(), Plan::Pro)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(err.status(), 404);
}
