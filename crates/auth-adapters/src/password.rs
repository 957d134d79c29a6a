//! Argon2-based implementation of `IdentityProvider`.
//! Handles account creation with salted hashes and password verification.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use tracing::{error, info, warn};

use domains::{DomainError, IdentityProvider, NewUser, Registration, Result, Role, User, UserRepo};

pub const MIN_PASSWORD_CHARS: usize = 6;
const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 3..=50;

/// Hashes a password into an Argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            DomainError::Store("password hashing failed".into())
        })
}

/// Verifies if a provided password matches a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn validate(registration: &Registration) -> Result<()> {
    let username = registration.username.trim();
    if !USERNAME_CHARS.contains(&username.chars().count()) {
        return Err(DomainError::Validation(format!(
            "username must be {} to {} characters",
            USERNAME_CHARS.start(),
            USERNAME_CHARS.end()
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(DomainError::Validation(
            "username may only contain letters, digits, '_', '-' and '.'".into(),
        ));
    }

    let looks_like_email = registration
        .email
        .trim()
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !looks_like_email {
        return Err(DomainError::Validation("email address is invalid".into()));
    }

    if registration.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::Validation(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

/// Runs the CPU-heavy Argon2 work off the async executor.
async fn blocking<T: Send + 'static>(work: impl FnOnce() -> T + Send + 'static) -> Result<T> {
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!(error = %e, "password worker panicked");
        DomainError::Store("password worker failed".into())
    })
}

pub struct PasswordIdentityProvider {
    users: Arc<dyn UserRepo>,
}

impl PasswordIdentityProvider {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for PasswordIdentityProvider {
    /// Self-registration always yields a `Standard` account.
    async fn create_account(&self, registration: Registration) -> Result<User> {
        validate(&registration)?;

        let password = registration.password;
        let password_hash = blocking(move || hash_password(&password)).await??;

        let username = registration.username.trim().to_string();
        let created = self
            .users
            .insert_user(NewUser {
                username: username.clone(),
                email: registration.email.trim().to_string(),
                password_hash,
                role: Role::Standard,
                age_group: registration.age_group,
            })
            .await
            .map_err(|e| {
                error!(error = %format!("{e:#}"), "store failure creating account");
                DomainError::Store("create account".into())
            })?;

        match created {
            Some(user) => {
                info!(user = %user.username, age_group = %user.age_group, "account created");
                Ok(user)
            }
            None => {
                warn!(user = %username, "registration with taken username");
                Err(DomainError::Conflict(format!("username {username} is already taken")))
            }
        }
    }

    /// Unknown users and wrong passwords produce the same outcome.
    async fn verify_credentials(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await
            .map_err(|e| {
                error!(error = %format!("{e:#}"), "store failure during login");
                DomainError::Store("verify credentials".into())
            })?;

        let Some(user) = user else {
            warn!(user = %username, "login attempt for unknown user");
            return Err(DomainError::InvalidCredentials);
        };

        let password = password.to_string();
        let hash = user.password_hash.clone();
        if !blocking(move || verify_password(&password, &hash)).await? {
            warn!(user = %username, "login attempt with wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        info!(user = %user.username, role = %user.role, "credentials verified");
        Ok(user)
    }
}
