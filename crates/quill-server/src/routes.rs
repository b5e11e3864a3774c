//! HTTP routes and handlers.
//!
//! Handlers stay thin: parse the body, resolve a principal where the
//! route needs one, delegate to the auth core, map the result. All
//! tenant scoping happens inside the core — no handler ever takes a
//! tenant ID from the request.

use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use quill_auth::resolver::extract_bearer;
use quill_auth::service::{LoginInput, RegisterInput};
use quill_auth::{AuthOutput, Principal};
use quill_core::models::note::{Note, NoteFilter};
use quill_core::models::tenant::{Plan, TenantView};
use quill_core::models::user::{Permissions, Role, UserView};
use quill_core::store::{NoteStore, TenantStore, UserStore};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router<T, U, N>(state: AppState<T, U, N>) -> Router
where
    T: TenantStore + Clone + 'static,
    U: UserStore + Clone + 'static,
    N: NoteStore + 'static,
{
    Router::<AppState<T, U, N>>::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/notes", post(create_note).get(list_notes))
        .route("/notes/{id}", delete(delete_note))
        .route("/tenant/plan", post(change_plan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    tenant_name: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct NoteBody {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlanBody {
    plan: Plan,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    user: UserView,
    tenant: TenantView,
    access_token: String,
    refresh_token: String,
    expires_in: u64,
}

impl From<AuthOutput> for AuthResponse {
    fn from(out: AuthOutput) -> Self {
        Self {
            user: out.user,
            tenant: out.tenant,
            access_token: out.access_token,
            refresh_token: out.refresh_token,
            expires_in: out.expires_in,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NoteResponse {
    id: Uuid,
    user_id: Uuid,
    title: String,
    created_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            title: note.title,
            created_at: note.created_at,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrincipalResponse {
    user_id: Uuid,
    tenant_id: Uuid,
    tenant_slug: String,
    role: Role,
    permissions: Permissions,
    is_admin: bool,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            user_id: principal.user_id,
            tenant_id: principal.tenant_id,
            tenant_slug: principal.tenant_slug.clone(),
            role: principal.role,
            permissions: principal.permissions,
            is_admin: principal.is_admin(),
        }
    }
}

/// Name of the cookie carrying the access token for browser clients.
const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Pull the credential from the `Authorization` header, falling back
/// to the access-token cookie. Both feed the same resolver path.
fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
        .or_else(|| {
            headers
                .get(COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(cookie_value)
        })
}

fn cookie_value(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == ACCESS_TOKEN_COOKIE && !value.is_empty() {
            Some(value)
        } else {
            None
        }
    })
}

async fn register<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    Json(body): Json<RegisterBody>,
) -> Result<Response, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let out = state
        .auth
        .register(RegisterInput {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            tenant_name: body.tenant_name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::from(out))).into_response())
}

async fn login<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let out = state
        .auth
        .login(LoginInput {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(AuthResponse::from(out)))
}

async fn refresh<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let out = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(serde_json::json!({
        "accessToken": out.access_token,
        "expiresIn": out.expires_in,
    })))
}

async fn logout<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    Json(body): Json<RefreshBody>,
) -> StatusCode
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    state.auth.logout(&body.refresh_token);
    StatusCode::NO_CONTENT
}

async fn me<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    headers: HeaderMap,
) -> Result<Json<PrincipalResponse>, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let principal = state.resolver.authenticate(bearer(&headers)).await?;
    Ok(Json(PrincipalResponse::from(&principal)))
}

async fn create_note<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    headers: HeaderMap,
    Json(body): Json<NoteBody>,
) -> Result<Response, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let principal = state.resolver.authenticate(bearer(&headers)).await?;
    if !principal.permissions.can_create_notes {
        return Err(ApiError::forbidden("missing permission: canCreateNotes"));
    }
    let note = state.notes.create_note(&principal, body.title).await?;
    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))).into_response())
}

async fn list_notes<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    headers: HeaderMap,
) -> Result<Json<Vec<NoteResponse>>, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let principal = state.resolver.authenticate(bearer(&headers)).await?;
    let notes = state
        .notes
        .list_notes(&principal, NoteFilter::default())
        .await
        .map_err(quill_auth::error::AuthError::from)?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

async fn delete_note<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let principal = state.resolver.authenticate(bearer(&headers)).await?;
    if !principal.permissions.can_delete_notes {
        return Err(ApiError::forbidden("missing permission: canDeleteNotes"));
    }
    state.notes.delete_note(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_plan<T, U, N>(
    State(state): State<AppState<T, U, N>>,
    headers: HeaderMap,
    Json(body): Json<PlanBody>,
) -> Result<Json<TenantView>, ApiError>
where
    T: TenantStore,
    U: UserStore,
    N: NoteStore,
{
    let principal = state.resolver.authenticate(bearer(&headers)).await?;
    if !principal.permissions.can_manage_tenant {
        return Err(ApiError::forbidden("missing permission: canManageTenant"));
    }
    let view = state
        .auth
        .upgrade_tenant(principal.tenant_id, body.plan)
        .await?;
    Ok(Json(view))
}
