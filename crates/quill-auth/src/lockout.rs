//! Login-attempt tracking and account lockout.
//!
//! Pure transition functions over [`Security`]: callers pass the
//! current state and get the next one back, then persist it through
//! the user store. Keeping the transitions pure makes the timing rules
//! directly testable without a store.

use chrono::{DateTime, Duration, Utc};
use quill_core::models::user::Security;

use crate::config::AuthConfig;

/// Record a failed login attempt.
///
/// An expired lock means the previous streak is over: the counter
/// restarts at 1 instead of continuing where it left off. Reaching
/// `max_login_attempts` sets `lock_until` to now plus the configured
/// lockout duration. An existing unexpired lock is never shortened.
pub fn register_failure(
    security: &Security,
    now: DateTime<Utc>,
    config: &AuthConfig,
) -> Security {
    let streak_expired = matches!(security.lock_until, Some(until) if until <= now);
    let attempts = if streak_expired {
        1
    } else {
        security.login_attempts.saturating_add(1)
    };

    let lock_until = if attempts >= config.max_login_attempts {
        let candidate = now + Duration::seconds(config.lockout_duration_secs as i64);
        match security.lock_until {
            Some(existing) if existing > candidate => Some(existing),
            _ => Some(candidate),
        }
    } else if streak_expired {
        None
    } else {
        security.lock_until
    };

    Security {
        login_attempts: attempts,
        lock_until,
        last_login: security.last_login,
    }
}

/// Record a successful login: clears the attempt counter and any lock,
/// stamps `last_login`.
pub fn register_success(_security: &Security, now: DateTime<Utc>) -> Security {
    Security {
        login_attempts: 0,
        lock_until: None,
        last_login: Some(now),
    }
}
