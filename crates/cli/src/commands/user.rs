//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli user create -e maya@example.com -n "Maya Chen" -r seller -p 'long passphrase'
//! bazaar-cli user set-password -e maya@example.com -p 'new passphrase'
//! ```
//!
//! Accounts created without a password exist (they can own products) but
//! cannot sign in until one is set.

use bazaar_core::{Email, UserRole};
use bazaar_storefront::db::{RepositoryError, UserRepository};
use bazaar_storefront::services::auth::hash_password;

use super::{CliError, connect};

/// Create a user with a role and, optionally, a password.
///
/// # Errors
///
/// Returns an error if the email, role or password is invalid, the email is
/// taken, or the database fails.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: Option<&str>,
) -> Result<(), CliError> {
    let (email, role) = parse_args(email, name, role)?;
    let password_hash = password.map(hash_password).transpose()?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let user = users
        .create(&email, name.trim(), role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                CliError::InvalidArgument(format!("a user with email {email} already exists"))
            }
            other => other.into(),
        })?;

    if let Some(hash) = &password_hash {
        users.set_password_hash(user.id, hash).await?;
    }

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        role = %user.role,
        can_sign_in = password_hash.is_some(),
        "User created"
    );
    Ok(())
}

/// Set or replace a user's password.
///
/// # Errors
///
/// Returns an error if the email is invalid, the password is too short, no
/// such user exists, or the database fails.
pub async fn set_password(email: &str, password: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    let hash = hash_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CliError::InvalidArgument(format!("no user with email {email}")))?;
    users.set_password_hash(user.id, &hash).await?;

    tracing::info!(user_id = %user.id, "Password updated");
    Ok(())
}

fn parse_args(email: &str, name: &str, role: &str) -> Result<(Email, UserRole), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    if name.trim().is_empty() {
        return Err(CliError::InvalidArgument("name must not be empty".to_string()));
    }
    let role = role
        .parse::<UserRole>()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    Ok((email, role))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_storefront::services::AuthError;

    use super::*;

    #[test]
    fn test_parse_args() {
        let (email, role) = parse_args("Maya@Example.COM", "Maya", "seller").unwrap();
        assert_eq!(email.as_str(), "Maya@example.com");
        assert_eq!(role, UserRole::Seller);
    }

    #[test]
    fn test_parse_args_rejects_unknown_role() {
        assert!(matches!(
            parse_args("maya@example.com", "Maya", "super_admin"),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_args_rejects_blank_name() {
        assert!(parse_args("maya@example.com", "  ", "customer").is_err());
    }

    #[tokio::test]
    async fn test_short_password_fails_before_connecting() {
        let result = create("maya@example.com", "Maya", "seller", Some("abc")).await;
        assert!(matches!(
            result,
            Err(CliError::Auth(AuthError::WeakPassword))
        ));
    }
}
