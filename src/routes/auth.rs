/// Session routes
///
/// Login issues a token pair and sets it as cookies; logout expires them.
/// `whoami` sits behind the token gate and only reports who the gate resolved.

use actix_web::{http::StatusCode, web, HttpMessage, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use super::{reject, request_context, Message};
use crate::auth::AuthService;
use crate::configuration::HttpSettings;
use crate::domain::{AuthenticatedUser, Credentials};
use crate::error::{AppError, ValidationError};
use crate::middleware::{expired_cookie, token_cookie};

/// Body of a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub status_code: u16,
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct LoginForm {
    #[serde(default)]
    login: String,
    #[serde(default)]
    password: String,
}

impl LoginForm {
    fn is_complete(&self) -> bool {
        !self.login.is_empty() && !self.password.is_empty()
    }
}

/// Credentials from the query string, falling back to the body
///
/// The body is read as a urlencoded form when the content type says so and as
/// JSON otherwise.
fn extract_credentials(req: &HttpRequest, body: &[u8]) -> Result<Credentials, ValidationError> {
    let from_query = web::Query::<LoginForm>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();

    let form = if from_query.is_complete() || body.is_empty() {
        from_query
    } else if req.content_type() == "application/x-www-form-urlencoded" {
        let raw = std::str::from_utf8(body)
            .map_err(|_| ValidationError::InvalidFormat("form body".to_string()))?;
        web::Query::<LoginForm>::from_query(raw)
            .map_err(|_| ValidationError::InvalidFormat("form body".to_string()))?
            .into_inner()
    } else {
        serde_json::from_slice::<LoginForm>(body)
            .map_err(|_| ValidationError::InvalidFormat("credentials".to_string()))?
    };

    if form.login.is_empty() {
        return Err(ValidationError::EmptyField("login".to_string()));
    }
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    Ok(Credentials::new(form.login, form.password))
}

/// POST /login
///
/// # Errors
/// - 400: login or password missing
/// - 404: unknown login
/// - 403: wrong password
/// - 500: tokens couldn't be issued
pub async fn login(
    req: HttpRequest,
    body: web::Bytes,
    auth: web::Data<AuthService>,
    http: web::Data<HttpSettings>,
) -> Result<HttpResponse, AppError> {
    let context = request_context(&req, "login");
    let credentials = extract_credentials(&req, &body).map_err(reject(&context))?;
    let context = context.with_login(&credentials.login);

    auth.authenticate_user(&credentials.login, &credentials.password)
        .await
        .map_err(reject(&context))?;
    let tokens = auth.issue_pair(&credentials.login).map_err(reject(&context))?;

    tracing::info!(
        request_id = %context.request_id,
        login = %credentials.login,
        "User logged in"
    );

    Ok(HttpResponse::Ok()
        .cookie(token_cookie(&http.access_cookie_name, &tokens.access_token))
        .cookie(token_cookie(&http.refresh_cookie_name, &tokens.refresh_token))
        .json(TokenResponse {
            status_code: StatusCode::OK.as_u16(),
            message: "OK".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }))
}

/// GET /logout
pub async fn logout(http: web::Data<HttpSettings>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(expired_cookie(&http.access_cookie_name))
        .cookie(expired_cookie(&http.refresh_cookie_name))
        .json(Message::new(StatusCode::OK, "cookies removed successfully"))
}

/// GET /i, GET /validate
pub async fn whoami(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    Message::respond(
        StatusCode::OK,
        format!("Hi {}!, your tokens are valid", user.login),
    )
}
