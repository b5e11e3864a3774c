//! Password hashing and verification using Argon2id.
//!
//! Parameters follow the OWASP baseline (m=19456 KiB, t=2, p=1) with a
//! fresh random salt per hash. Verification in the login path never
//! errors: empty inputs and malformed stored hashes all come back as
//! a plain mismatch, so one user's corrupt record cannot distinguish
//! itself from a wrong password.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

use crate::error::AuthError;

const ARGON2_MEMORY_KIB: u32 = 19_456;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_PARALLELISM, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params: {e}")))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            buf.push_str(p);
            buf.push_str(password);
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a plaintext password into a PHC-format Argon2id string.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);
    let salt = SaltString::generate(&mut OsRng);
    hasher()?
        .hash_password(input, &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Crypto(format!("hash error: {e}")))
}

/// Verify a plaintext password against a stored PHC-format hash.
///
/// Returns `false` for empty password, empty hash, malformed hash, or
/// mismatch. Never errors — the login flow treats every non-match the
/// same way.
pub fn verify_password(password: &str, hash: &str, pepper: Option<&str>) -> bool {
    if password.is_empty() || hash.is_empty() {
        return false;
    }

    let Ok(parsed_hash) = argon2::PasswordHash::new(hash) else {
        return false;
    };

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);
    Argon2::default().verify_password(input, &parsed_hash).is_ok()
}
