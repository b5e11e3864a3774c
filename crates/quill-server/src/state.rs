//! Shared application state.

use std::sync::Arc;

use quill_auth::{AuthConfig, AuthResolver, AuthService, NoteService, RevocationRegistry};
use quill_core::store::{NoteStore, TenantStore, UserStore};

/// Application state, generic over the store backend. The services
/// share cloned store handles and one revocation registry per process.
pub struct AppState<T, U, N> {
    pub auth: Arc<AuthService<T, U>>,
    pub resolver: Arc<AuthResolver<U, T>>,
    pub notes: Arc<NoteService<T, N>>,
}

impl<T, U, N> Clone for AppState<T, U, N> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            resolver: Arc::clone(&self.resolver),
            notes: Arc::clone(&self.notes),
        }
    }
}

impl<T, U, N> AppState<T, U, N>
where
    T: TenantStore + Clone,
    U: UserStore + Clone,
    N: NoteStore,
{
    pub fn new(tenants: T, users: U, notes: N, config: AuthConfig) -> Self {
        let revocations = RevocationRegistry::new();
        Self {
            auth: Arc::new(
                AuthService::new(tenants.clone(), users.clone(), config.clone())
                    .with_revocations(revocations),
            ),
            resolver: Arc::new(AuthResolver::new(users, tenants.clone(), config)),
            notes: Arc::new(NoteService::new(tenants, notes)),
        }
    }
}
