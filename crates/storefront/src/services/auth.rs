//! Password sign-in.
//!
//! Accounts get a password through `bazaar-cli user create --password` or
//! `bazaar-cli user set-password`. There is no self-service registration or
//! reset flow.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::Email;

use crate::db::{RepositoryError, UserRepository};
use crate::models::CurrentUser;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during sign-in or password setup.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, no password on the account, or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checks credentials against the user table.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check an email and password and return the identity to store in the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for any mismatch, without
    /// saying which part was wrong. Malformed emails fail the same way
    /// before the database is queried.
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, hash) = UserRepository::new(self.pool)
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let hash = hash.ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &hash)?;

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
        })
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` below [`MIN_PASSWORD_LENGTH`]
/// characters.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
