//! Argon2 password hashing.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use std::sync::LazyLock;

use crate::{EngineError, ResultEngine};

/// Hash checked when the username is unknown, so that a failed login costs
/// one Argon2 verification whether or not the account exists.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("family-budget-dummy-password").ok());

/// Hashes `password` into a PHC string with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> ResultEngine<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| EngineError::Password(err.to_string()))
}

/// Returns `true` when `password` matches the stored `hash`.
///
/// A malformed stored hash never verifies.
pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::error!("stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Spends the same work as [`verify_password`] for a login whose username
/// matched no account. Always `false`.
pub(crate) fn verify_missing_user(password: &str) -> bool {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}
