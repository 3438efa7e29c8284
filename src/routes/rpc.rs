/// Token validation for other services
///
/// JSON rendition of the `Validate` RPC: callers forward the token pair a
/// client gave them and get back the resolved login plus, when the access token
/// had expired, a freshly minted pair to hand back to that client.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{reject, request_context};
use crate::auth::{resolve, AuthService, RefreshError, RefreshOutcome, ValidationStatus};
use crate::error::AppError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// Tokens are only filled in when `is_update` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub status: ValidationStatus,
    pub access_token: String,
    pub refresh_token: String,
    pub login: String,
    pub success: bool,
    pub is_update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    fn accepted(status: ValidationStatus, login: String) -> Self {
        Self {
            status,
            access_token: String::new(),
            refresh_token: String::new(),
            login,
            success: true,
            is_update: false,
            error: None,
        }
    }
}

/// POST /rpc/validate
///
/// # Errors
/// - 403 with a `ValidateResponse` body: neither token is valid
/// - 500: the refresh token was valid but new tokens couldn't be minted
pub async fn validate(
    req: HttpRequest,
    body: web::Json<ValidateRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = request_context(&req, "rpc_validate");
    let result = resolve(&auth, &body.access_token, &body.refresh_token);
    let status = ValidationStatus::from(&result);

    match result {
        Ok(RefreshOutcome::AccessValid { login }) => {
            Ok(HttpResponse::Ok().json(ValidateResponse::accepted(status, login)))
        }
        Ok(RefreshOutcome::Rotated { login, tokens }) => {
            Ok(HttpResponse::Ok().json(ValidateResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                is_update: true,
                ..ValidateResponse::accepted(status, login)
            }))
        }
        Err(RefreshError::Rejected(e)) => {
            tracing::debug!(request_id = %context.request_id, error = %e, "Token pair rejected");
            Ok(HttpResponse::Forbidden().json(ValidateResponse {
                success: false,
                error: Some(e.to_string()),
                ..ValidateResponse::accepted(status, String::new())
            }))
        }
        Err(e) => Err(reject(&context)(e)),
    }
}
