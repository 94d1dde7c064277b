//! Guest Identity Guard
//!
//! Guest orders are tracked by a human-chosen code instead of an account.
//! The stored form is a salted argon2 hash, so a database dump never
//! reveals valid codes and outsiders cannot enumerate them. The price of
//! the salt is lookup: there is no indexable value, so verification scans
//! guest orders and hash-checks each candidate. Acceptable while guest
//! volume stays bounded; the known scaling escape hatch is a keyed
//! deterministic digest kept alongside the display hash.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use crate::db::repository::{RepoResult, order};
use shared::AppError;

/// Hash a plaintext guest code for storage.
pub fn hash_code(code: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("Failed to hash order code: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a plaintext code against a stored hash.
pub fn verify_code(code: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(code.as_bytes(), &parsed)
        .is_ok()
}

/// Locate the guest order whose stored hash matches `code`, if any.
pub async fn find_guest_order(pool: &SqlitePool, code: &str) -> RepoResult<Option<i64>> {
    let rows = order::guest_code_rows(pool).await?;
    for (order_id, hash) in rows {
        if verify_code(code, &hash) {
            return Ok(Some(order_id));
        }
    }
    Ok(None)
}

/// Whether `code` collides with any existing order code, plaintext or guest.
pub async fn code_taken(pool: &SqlitePool, code: &str) -> RepoResult<bool> {
    if order::find_by_code_plain(pool, code).await?.is_some() {
        return Ok(true);
    }
    Ok(find_guest_order(pool, code).await?.is_some())
}
