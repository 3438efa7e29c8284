/// Error Handling Module
///
/// One closed taxonomy per layer:
/// 1. Token codec errors (issuing and parsing)
/// 2. User store errors
/// 3. Core authentication errors (what the service and refresh protocol return)
/// 4. Application errors (what HTTP adapters turn into responses)
///
/// Adapters dispatch on the variant, never on message text.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::auth::RefreshError;

/// ============================================================================
/// 1. TOKEN CODEC ERRORS
/// ============================================================================

/// Reasons a token could not be issued.
///
/// Checked in declaration order: secret, then duration, then subject.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    #[error("secret for token signing is not provided")]
    EmptySecret,
    #[error("token lifetime must be greater than zero")]
    NonPositiveDuration,
    #[error("cannot issue a token without a subject")]
    EmptySubject,
    #[error("token lifetime is out of range")]
    DurationOutOfRange,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Reasons a token string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed: {0}")]
    Malformed(String),
}

/// ============================================================================
/// 2. USER STORE ERRORS
/// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(String),
    #[error("user {0} already exists")]
    Duplicate(String),
    #[error("store operation timed out")]
    Timeout,
    #[error("store error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound(String::new()),
            sqlx::Error::PoolTimedOut => StoreError::Timeout,
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// ============================================================================
/// 3. CORE AUTHENTICATION ERRORS
/// ============================================================================

/// Validation errors for input credentials
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    EmptyField(String),
    #[error("{0} has invalid format")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("couldn't find user {0}")]
    NotFound(String),
    #[error("bad password")]
    WrongPassword,
    #[error("invalid credentials: {0}")]
    ValidationFailed(ValidationError),
    #[error("token has expired")]
    TokenExpired,
    #[error("token is malformed: {0}")]
    TokenMalformed(String),
    #[error("token signature is invalid")]
    TokenSignatureInvalid,
    #[error("unknown token type: {0}")]
    UnknownTokenType(String),
    #[error("cannot issue token: {0}")]
    ConfigInvalid(IssueError),
    #[error(transparent)]
    Store(StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable tag used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotFound(_) => "NOT_FOUND",
            AuthError::WrongPassword => "WRONG_PASSWORD",
            AuthError::ValidationFailed(_) => "VALIDATION_FAILED",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::TokenMalformed(_) => "TOKEN_MALFORMED",
            AuthError::TokenSignatureInvalid => "TOKEN_SIGNATURE_INVALID",
            AuthError::UnknownTokenType(_) => "UNKNOWN_TOKEN_TYPE",
            AuthError::ConfigInvalid(_) => "CONFIG_INVALID",
            AuthError::Store(StoreError::Duplicate(_)) => "DUPLICATE_ENTRY",
            AuthError::Store(StoreError::NotFound(_)) => "NOT_FOUND",
            AuthError::Store(_) => "STORE_UNAVAILABLE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NotFound(_) | AuthError::Store(StoreError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AuthError::WrongPassword
            | AuthError::TokenExpired
            | AuthError::TokenMalformed(_)
            | AuthError::TokenSignatureInvalid => StatusCode::FORBIDDEN,
            AuthError::ValidationFailed(_) | AuthError::UnknownTokenType(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            AuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::ConfigInvalid(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<IssueError> for AuthError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Signing(msg) => AuthError::Internal(msg),
            other => AuthError::ConfigInvalid(other),
        }
    }
}

impl From<ParseError> for AuthError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::SignatureInvalid => AuthError::TokenSignatureInvalid,
            ParseError::Expired => AuthError::TokenExpired,
            ParseError::Malformed(msg) => AuthError::TokenMalformed(msg),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::ValidationFailed(err)
    }
}

/// ============================================================================
/// 4. APPLICATION ERRORS
/// ============================================================================

/// Configuration errors, raised once at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
    #[error("Config parse error: {0}")]
    ParseError(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Central error type returned by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(ValidationError),
    #[error(transparent)]
    Auth(AuthError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

/// Rejections keep their token error; a failed rotation is always a server error
impl From<RefreshError> for AppError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Rejected(e) => AppError::Auth(e),
            RefreshError::Minting(e) if e.status_code().is_server_error() => AppError::Auth(e),
            RefreshError::Minting(e) => AppError::Internal(e.to_string()),
        }
    }
}

// ============================================================================
// HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking (request ID or trace ID)
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),
            AppError::Auth(e) => {
                let status = e.status_code();
                // Server-side failures don't leak their details
                let message = if status.is_server_error() {
                    "Internal server error".to_string()
                } else {
                    e.to_string()
                };
                (status, e.code().to_string(), message)
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
            ),
        };

        let error_response =
            ErrorResponse::new(request_id.to_string(), message, code, status.as_u16());

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Auth(e) if e.status_code().is_server_error() => {
                tracing::error!(request_id = request_id, error = %e, code = e.code(), "Authentication service failure");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, code = e.code(), "Authentication error");
            }
            AppError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
        }
    }
}

// Behind `LoggerMiddleware` this body is re-rendered and logged under the
// request's own ID; the generated one only shows up without it.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => e.status_code(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context attached to handler logs
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub login: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            login: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn log_error(&self, error: &AppError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "login": self.login,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        match error {
            AppError::Validation(_) | AppError::Auth(_) => {
                tracing::warn!(error = %error, context = ?context, "Request rejected");
            }
            AppError::Internal(_) => {
                tracing::error!(error = %error, context = ?context, "Request failed");
            }
        }
    }
}
