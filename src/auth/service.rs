/// Authentication Service
///
/// Orchestrates credential checks, user CRUD and token issuance on top of a
/// `UserStore`. Holds no per-request state: one instance is built at startup
/// and shared by every worker.
///
/// Store-backed operations are async; dropping the returned future cancels the
/// in-flight store call. Token operations are CPU-only and synchronous.

use std::sync::Arc;

use crate::auth::jwt::{issue_token, parse_token};
use crate::auth::password::{hash_password_with_cost, verify_password};
use crate::configuration::JwtSettings;
use crate::domain::{Credentials, TokenPair, TokenType};
use crate::error::{AuthError, StoreError, ValidationError};
use crate::store::UserStore;

#[derive(Clone)]
pub struct AuthService {
    jwt: Arc<JwtSettings>,
    store: Arc<dyn UserStore>,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(jwt: JwtSettings, store: Arc<dyn UserStore>) -> Self {
        Self {
            jwt: Arc::new(jwt),
            store,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Use a different bcrypt cost for newly hashed passwords
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn jwt_settings(&self) -> &JwtSettings {
        &self.jwt
    }

    /// Check `password` against the stored hash for `login`
    ///
    /// Issues nothing; callers mint tokens separately once this succeeds.
    ///
    /// # Errors
    /// - `NotFound` if the store has no such login
    /// - `WrongPassword` if the hash doesn't match
    /// - `Store` for any other store failure
    #[tracing::instrument(name = "auth.authenticate_user", skip(self, password))]
    pub async fn authenticate_user(&self, login: &str, password: &str) -> Result<(), AuthError> {
        let stored = self.store.get_user(login).await.map_err(|e| {
            tracing::debug!(error = %e, "Couldn't get user from store");
            store_error(e, login)
        })?;

        if verify_password(password, &stored.password) {
            Ok(())
        } else {
            tracing::debug!("Wrong password");
            Err(AuthError::WrongPassword)
        }
    }

    /// Issue a token of `token_type` for `login`
    #[tracing::instrument(name = "auth.issue_token", skip(self))]
    pub fn issue_token(&self, login: &str, token_type: TokenType) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.jwt.access_ttl(),
            TokenType::Refresh => self.jwt.refresh_ttl(),
        };

        issue_token(login, &self.jwt.secret, ttl)
            .map(|token| {
                tracing::debug!("Token issued");
                token
            })
            .map_err(|e| {
                tracing::warn!(error = %e, "Couldn't issue token");
                AuthError::from(e)
            })
    }

    /// Like `issue_token`, for a token type named by string ("access"/"refresh")
    ///
    /// # Errors
    /// `UnknownTokenType` for any other name
    pub fn issue_token_named(&self, login: &str, token_type: &str) -> Result<String, AuthError> {
        let token_type = token_type.parse::<TokenType>()?;
        self.issue_token(login, token_type)
    }

    /// Issue a fresh access token and a fresh refresh token for `login`
    ///
    /// Either both tokens are returned or neither.
    pub fn issue_pair(&self, login: &str) -> Result<TokenPair, AuthError> {
        let access_token = self.issue_token(login, TokenType::Access)?;
        let refresh_token = self.issue_token(login, TokenType::Refresh)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate a token and return the login embedded in it
    #[tracing::instrument(name = "auth.validate_token", skip_all)]
    pub fn validate_token(&self, token: &str) -> Result<String, AuthError> {
        match parse_token(token, &self.jwt.secret) {
            Ok(login) => {
                tracing::debug!(login = %login, "Token is valid");
                Ok(login)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Couldn't validate token");
                Err(e.into())
            }
        }
    }

    /// Hash the password and create the record
    ///
    /// Empty login or password is rejected before hashing; the store is never
    /// called in that case.
    #[tracing::instrument(name = "auth.create_user", skip(self, credentials), fields(login = %credentials.login))]
    pub async fn create_user(&self, mut credentials: Credentials) -> Result<(), AuthError> {
        validate_credentials(&credentials)?;

        credentials.password = hash_password_with_cost(&credentials.password, self.hash_cost)?;

        self.store.create_user(&credentials).await.map_err(|e| {
            tracing::debug!(error = %e, "Couldn't create user");
            store_error(e, &credentials.login)
        })?;

        tracing::info!("User created");
        Ok(())
    }

    #[tracing::instrument(name = "auth.get_user", skip(self))]
    pub async fn get_user(&self, login: &str) -> Result<Credentials, AuthError> {
        self.store.get_user(login).await.map_err(|e| {
            tracing::debug!(error = %e, "Couldn't get user");
            store_error(e, login)
        })
    }

    /// Re-hash the password and write it over the existing record
    #[tracing::instrument(name = "auth.update_user", skip(self, credentials), fields(login = %credentials.login))]
    pub async fn update_user(&self, mut credentials: Credentials) -> Result<(), AuthError> {
        validate_credentials(&credentials)?;

        credentials.password = hash_password_with_cost(&credentials.password, self.hash_cost)?;

        self.store.update_user(&credentials).await.map_err(|e| {
            tracing::debug!(error = %e, "Couldn't update user");
            store_error(e, &credentials.login)
        })
    }

    #[tracing::instrument(name = "auth.delete_user", skip(self))]
    pub async fn delete_user(&self, login: &str) -> Result<(), AuthError> {
        self.store.delete_user(login).await.map_err(|e| {
            tracing::debug!(error = %e, "Couldn't delete user");
            store_error(e, login)
        })
    }
}

fn validate_credentials(credentials: &Credentials) -> Result<(), ValidationError> {
    if credentials.login.is_empty() {
        return Err(ValidationError::EmptyField("login".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    Ok(())
}

fn store_error(err: StoreError, login: &str) -> AuthError {
    match err {
        StoreError::NotFound(_) => AuthError::NotFound(login.to_string()),
        other => AuthError::Store(other),
    }
}
