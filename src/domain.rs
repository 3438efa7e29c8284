/// Domain models shared by the core and its adapters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuthError;

/// A login/password record.
///
/// `password` holds plaintext on the way in and a bcrypt hash once it has
/// passed through the authentication service. The store only ever sees hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Assigned by the store on creation, never taken from a request body
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: None,
            login: login.into(),
            password: password.into(),
        }
    }
}

/// Which lifetime a token is issued with.
///
/// Access and refresh tokens carry the same claims; the type only picks the TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" => Ok(TokenType::Access),
            "refresh" => Ok(TokenType::Refresh),
            _ => Err(AuthError::UnknownTokenType(s.to_string())),
        }
    }
}

/// Freshly minted access + refresh tokens for one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identity resolved by the token gate.
///
/// Inserted into request extensions once per request; handlers read it with
/// `web::ReqData<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub login: String,
}

impl AuthenticatedUser {
    pub fn new(login: impl Into<String>) -> Self {
        Self { login: login.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_parsing() {
        assert_eq!("access".parse::<TokenType>().unwrap(), TokenType::Access);
        assert_eq!("Refresh".parse::<TokenType>().unwrap(), TokenType::Refresh);
    }

    #[test]
    fn test_unknown_token_type() {
        match "session".parse::<TokenType>() {
            Err(AuthError::UnknownTokenType(value)) => assert_eq!(value, "session"),
            other => panic!("Expected UnknownTokenType, got {:?}", other),
        }
    }

    #[test]
    fn test_credentials_deserialize_without_id() {
        let creds: Credentials =
            serde_json::from_str(r#"{"login":"admin","password":"secret"}"#).unwrap();

        assert_eq!(creds, Credentials::new("admin", "secret"));
        assert!(creds.id.is_none());
    }

    #[test]
    fn test_credentials_ignore_client_id() {
        let creds: Credentials = serde_json::from_str(
            r#"{"id":"00000000-0000-0000-0000-000000000000","login":"admin","password":"secret"}"#,
        )
        .unwrap();

        assert!(creds.id.is_none());
    }
}
