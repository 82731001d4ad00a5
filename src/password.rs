//! Password hashing for stored credentials.

/// bcrypt work factor applied to every stored hash.
pub const HASH_COST: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The account has no stored hash. Treated as its own failure, never as a mismatch.
    #[error("no password is set for this account")]
    Missing,

    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
}

/// Salted one-way hash of `plain`.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plain, HASH_COST)?)
}

/// Checks `candidate` against the stored hash.
///
/// Returns `Ok(false)` on a mismatch and `Err(PasswordError::Missing)` when the
/// account has no hash at all, so callers decide how to surface that case.
pub fn verify_password(candidate: &str, stored: Option<&str>) -> Result<bool, PasswordError> {
    let hash = stored.ok_or(PasswordError::Missing)?;
    Ok(bcrypt::verify(candidate, hash)?)
}
