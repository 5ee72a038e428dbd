//! Account email addresses.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an [`Email`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("email must be between 1 and {} characters", Email::MAX_LENGTH)]
    Length,
    #[error("email must have the form name@domain")]
    Malformed,
}

/// The address an account signs in with.
///
/// Whitespace around the input is dropped and the domain is lowercased;
/// the mailbox name keeps its case.
///
/// ```
/// use bazaar_core::Email;
///
/// let email = Email::parse(" Shopper@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Shopper@example.com");
/// assert!(Email::parse("no-at-symbol").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
pub struct Email(String);

impl Email {
    /// RFC 5321 path limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalize an address.
    ///
    /// # Errors
    ///
    /// `Length` for empty or over-long input, `Malformed` unless there is
    /// exactly one `@` with text on both sides.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() || s.len() > Self::MAX_LENGTH {
            return Err(EmailError::Length);
        }

        match s.split_once('@') {
            Some((mailbox, domain))
                if !mailbox.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(format!("{mailbox}@{}", domain.to_ascii_lowercase())))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_mailbox_case() {
        let email = Email::parse("  Buyer@Market.IO\n").unwrap();
        assert_eq!(email.as_str(), "Buyer@market.io");
        assert!(Email::parse("user+tag@shop.example.co.uk").is_ok());
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(Email::parse("   "), Err(EmailError::Length));
        assert_eq!(
            Email::parse(&format!("{}@example.com", "a".repeat(250))),
            Err(EmailError::Length)
        );
        for bad in ["plain", "a@b@c", "@shop.io", "user@"] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let email: Email = serde_json::from_str("\"user@EXAMPLE.com\"").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
