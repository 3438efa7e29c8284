/// JWT Claims structure
///
/// Access and refresh tokens share this payload: the subject (login) and an
/// absolute expiry. Nothing in the token says which kind it is.

use serde::{Deserialize, Serialize};

use crate::error::IssueError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (login)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Create claims for `subject` that expire `ttl` from now
    ///
    /// # Errors
    /// `DurationOutOfRange` if the expiry can't be represented as a timestamp
    pub fn new(subject: impl Into<String>, ttl: chrono::Duration) -> Result<Self, IssueError> {
        let now = chrono::Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(IssueError::DurationOutOfRange)?;

        Ok(Self {
            sub: subject.into(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new("admin", chrono::Duration::seconds(3600)).unwrap();

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expiry_past_timestamp_range() {
        let ttl = chrono::Duration::seconds(1_000_000_000_000_000);

        assert_eq!(Claims::new("admin", ttl), Err(IssueError::DurationOutOfRange));
        assert_eq!(
            Claims::new("admin", chrono::Duration::MAX),
            Err(IssueError::DurationOutOfRange)
        );
    }
}
