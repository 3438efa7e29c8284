/// Dual-token refresh protocol
///
/// Given the access and refresh tokens a client presented, decide between:
///
/// | State                       | Outcome                                       |
/// |-----------------------------|-----------------------------------------------|
/// | `AccessValid`               | accept the access token's login, mint nothing |
/// | `AccessExpiredRefreshValid` | mint a new access AND refresh token           |
/// | `BothInvalid`               | reject with the refresh token's error         |
///
/// The HTTP token gate and the RPC validation endpoint both call `resolve` and
/// only translate its result.

use serde::{Deserialize, Serialize};

use crate::auth::service::AuthService;
use crate::domain::TokenPair;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    AccessValid,
    AccessExpiredRefreshValid,
    BothInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The access token is alive
    AccessValid { login: String },
    /// The refresh token was alive; both tokens were replaced
    Rotated { login: String, tokens: TokenPair },
}

impl RefreshOutcome {
    pub fn login(&self) -> &str {
        match self {
            RefreshOutcome::AccessValid { login } | RefreshOutcome::Rotated { login, .. } => login,
        }
    }

    /// New tokens the caller must hand back to the client, if any
    pub fn rotated_tokens(&self) -> Option<&TokenPair> {
        match self {
            RefreshOutcome::AccessValid { .. } => None,
            RefreshOutcome::Rotated { tokens, .. } => Some(tokens),
        }
    }

    pub fn state(&self) -> RefreshState {
        match self {
            RefreshOutcome::AccessValid { .. } => RefreshState::AccessValid,
            RefreshOutcome::Rotated { .. } => RefreshState::AccessExpiredRefreshValid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// Neither token validated. Carries the refresh token's error.
    #[error("both tokens are invalid: {0}")]
    Rejected(AuthError),
    /// The refresh token was valid but a replacement couldn't be minted
    #[error("couldn't rotate tokens: {0}")]
    Minting(AuthError),
}

impl RefreshError {
    pub fn state(&self) -> Option<RefreshState> {
        match self {
            RefreshError::Rejected(_) => Some(RefreshState::BothInvalid),
            RefreshError::Minting(_) => None,
        }
    }

    pub fn into_inner(self) -> AuthError {
        match self {
            RefreshError::Rejected(e) | RefreshError::Minting(e) => e,
        }
    }
}

/// Three-way result reported to remote callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationStatus {
    ValidNoUpdate,
    ValidUpdated,
    Invalid,
}

impl From<&Result<RefreshOutcome, RefreshError>> for ValidationStatus {
    fn from(result: &Result<RefreshOutcome, RefreshError>) -> Self {
        match result {
            Ok(RefreshOutcome::AccessValid { .. }) => ValidationStatus::ValidNoUpdate,
            Ok(RefreshOutcome::Rotated { .. }) => ValidationStatus::ValidUpdated,
            Err(_) => ValidationStatus::Invalid,
        }
    }
}

/// Run the refresh protocol for one `(access, refresh)` pair
///
/// Concurrent calls with the same refresh token may each mint their own pair;
/// every resulting pair stays valid until its own expiry.
///
/// # Errors
/// - `Rejected` if neither token validates
/// - `Minting` if the refresh token validated but either new token couldn't be
///   issued; no partial pair is returned
pub fn resolve(
    auth: &AuthService,
    access_token: &str,
    refresh_token: &str,
) -> Result<RefreshOutcome, RefreshError> {
    let access_error = match auth.validate_token(access_token) {
        Ok(login) => {
            tracing::debug!(login = %login, "Access token is alive");
            return Ok(RefreshOutcome::AccessValid { login });
        }
        Err(e) => e,
    };

    let login = auth.validate_token(refresh_token).map_err(|e| {
        tracing::debug!(
            access_error = %access_error,
            refresh_error = %e,
            "Both tokens are invalid"
        );
        RefreshError::Rejected(e)
    })?;

    let tokens = auth.issue_pair(&login).map_err(|e| {
        tracing::warn!(login = %login, error = %e, "Couldn't rotate tokens");
        RefreshError::Minting(e)
    })?;

    tracing::info!(login = %login, "Tokens rotated from refresh token");
    Ok(RefreshOutcome::Rotated { login, tokens })
}
