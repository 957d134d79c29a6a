//! Creates the initial administrator so a fresh deployment can publish posts.

use tracing::{error, info};

use domains::{AgeGroup, DomainError, NewUser, Result, Role, User, UserRepo};

use crate::password::hash_password;

/// The administrator account to guarantee at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
    pub age_group: AgeGroup,
}

/// Creates the admin account unless a user with that name already exists.
/// Returns the new account, or `None` when nothing had to be done.
pub async fn ensure_admin(users: &dyn UserRepo, seed: AdminSeed) -> Result<Option<User>> {
    let store_error = |e: anyhow::Error| {
        error!(error = %format!("{e:#}"), "store failure seeding admin");
        DomainError::Store("seed admin".into())
    };

    if users
        .find_by_username(&seed.username)
        .await
        .map_err(store_error)?
        .is_some()
    {
        info!(user = %seed.username, "admin user already exists");
        return Ok(None);
    }

    let password = seed.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| DomainError::Store(format!("password worker failed: {e}")))??;

    let created = users
        .insert_user(NewUser {
            username: seed.username.clone(),
            email: seed.email,
            password_hash,
            role: Role::Admin,
            age_group: seed.age_group,
        })
        .await
        .map_err(store_error)?;

    if let Some(user) = &created {
        info!(user = %user.username, "admin user created");
    }
    Ok(created)
}
