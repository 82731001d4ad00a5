//! Bootstrap admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_NAME`.

use crate::{
    config::AdminSeed,
    models::{NewUser, Role, User},
    password::{PasswordError, hash_password},
    repository::Repository,
};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),
}

/// ensure_admin
///
/// Creates the admin account unless a user with that email already exists.
/// An existing account is left untouched, role and password included. Returns
/// the created user, or `None` when nothing was done.
pub async fn ensure_admin(repo: &dyn Repository, seed: &AdminSeed) -> Result<Option<User>, SeedError> {
    let email = seed.email.trim().to_lowercase();
    if repo.get_user_by_email(&email).await?.is_some() {
        tracing::debug!(%email, "admin seed skipped, account exists");
        return Ok(None);
    }

    let user = repo
        .create_user(NewUser {
            name: seed.name.clone(),
            email,
            password_hash: Some(hash_password(&seed.password)?),
            role: Role::Admin,
            bio: None,
        })
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "admin account created");
    Ok(Some(user))
}
