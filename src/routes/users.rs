/// User CRUD routes
///
/// Thin adapters over `AuthService`; passwords are hashed in the service and
/// never leave it.

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{reject, request_context, Message};
use crate::auth::AuthService;
use crate::domain::Credentials;
use crate::error::AppError;

/// Public view of a stored user
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Option<Uuid>,
    pub login: String,
}

/// POST /user
///
/// # Errors
/// - 400: login or password empty
/// - 409: login already taken
pub async fn create_user(
    req: HttpRequest,
    body: web::Json<Credentials>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let credentials = body.into_inner();
    let login = credentials.login.clone();
    let context = request_context(&req, "create_user").with_login(&login);

    auth.create_user(credentials).await.map_err(reject(&context))?;

    Ok(Message::respond(
        StatusCode::CREATED,
        format!("user {} created", login),
    ))
}

/// GET /user/{login}
pub async fn get_user(
    req: HttpRequest,
    path: web::Path<String>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let login = path.into_inner();
    let context = request_context(&req, "get_user").with_login(&login);

    let user = auth.get_user(&login).await.map_err(reject(&context))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        login: user.login,
    }))
}

/// PUT /user
///
/// Replaces the password of an existing login.
pub async fn update_user(
    req: HttpRequest,
    body: web::Json<Credentials>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let credentials = body.into_inner();
    let login = credentials.login.clone();
    let context = request_context(&req, "update_user").with_login(&login);

    auth.update_user(credentials).await.map_err(reject(&context))?;

    Ok(Message::respond(
        StatusCode::OK,
        format!("user {} updated", login),
    ))
}

/// DELETE /user/{login}
pub async fn delete_user(
    req: HttpRequest,
    path: web::Path<String>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let login = path.into_inner();
    let context = request_context(&req, "delete_user").with_login(&login);

    auth.delete_user(&login).await.map_err(reject(&context))?;

    Ok(Message::respond(
        StatusCode::OK,
        format!("user {} deleted", login),
    ))
}
