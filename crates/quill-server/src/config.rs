//! Server configuration loaded from the environment.

use std::env;
use std::time::Duration;

use quill_auth::AuthConfig;
use quill_db::DbConfig;

/// Which store implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// SurrealDB over WebSocket.
    Surreal,
    /// In-memory fixture store, for development and demos.
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub backend: StoreBackend,
    pub db: DbConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Build configuration from `QUILL_*` environment variables,
    /// falling back to development defaults for everything except the
    /// JWT secret.
    pub fn from_env() -> Result<Self, String> {
        let backend = match env::var("QUILL_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("surreal") | Err(_) => StoreBackend::Surreal,
            Ok(other) => return Err(format!("unknown QUILL_STORE backend: {other}")),
        };

        let jwt_secret =
            env::var("QUILL_JWT_SECRET").map_err(|_| "QUILL_JWT_SECRET is required".to_string())?;

        let mut db = DbConfig::default();
        if let Ok(url) = env::var("QUILL_DB_URL") {
            db.url = url;
        }
        if let Ok(ns) = env::var("QUILL_DB_NAMESPACE") {
            db.namespace = ns;
        }
        if let Ok(name) = env::var("QUILL_DB_NAME") {
            db.database = name;
        }
        if let Ok(user) = env::var("QUILL_DB_USER") {
            db.username = user;
        }
        if let Ok(pass) = env::var("QUILL_DB_PASS") {
            db.password = pass;
        }
        if let Ok(secs) = env::var("QUILL_DB_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| format!("bad QUILL_DB_TIMEOUT_SECS: {e}"))?;
            db.operation_timeout = Duration::from_secs(secs);
        }

        let auth = AuthConfig {
            jwt_secret,
            pepper: env::var("QUILL_PASSWORD_PEPPER").ok(),
            ..AuthConfig::default()
        };

        Ok(Self {
            listen_addr: env::var("QUILL_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            backend,
            db,
            auth,
        })
    }
}
