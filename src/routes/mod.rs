mod auth;
mod health_check;
mod rpc;
mod users;

pub use auth::{login, logout, whoami, TokenResponse};
pub use health_check::health_check;
pub use rpc::{validate, ValidateRequest, ValidateResponse};
pub use users::{create_user, delete_user, get_user, update_user, UserResponse};

use actix_web::{http::StatusCode, HttpMessage, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorContext};
use crate::middleware::RequestId;

/// Plain status body returned by handlers that carry no other payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub status_code: u16,
    pub message: String,
    pub is_error: bool,
}

impl Message {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            is_error: status.as_u16() >= 400,
        }
    }

    pub fn respond(status: StatusCode, message: impl Into<String>) -> HttpResponse {
        HttpResponse::build(status).json(Self::new(status, message))
    }
}

/// Handler context carrying the request ID assigned by `LoggerMiddleware`
fn request_context(req: &HttpRequest, operation: &str) -> ErrorContext {
    let context = ErrorContext::new(operation);
    match req.extensions().get::<RequestId>() {
        Some(id) => context.with_request_id(id.0.clone()),
        None => context,
    }
}

/// Log `err` with the handler context before it becomes the response
fn reject<E: Into<AppError>>(context: &ErrorContext) -> impl Fn(E) -> AppError + '_ {
    move |err| {
        let err = err.into();
        context.log_error(&err);
        err
    }
}
