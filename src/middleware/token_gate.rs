/// Token Gate Middleware
///
/// Runs the refresh protocol on the access/refresh cookies before protected
/// routes. On success the resolved `AuthenticatedUser` is injected into
/// request extensions; when the tokens were rotated both new cookies are set
/// on the response.

use actix_web::{
    cookie::Cookie,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{resolve, AuthService};
use crate::configuration::HttpSettings;
use crate::domain::AuthenticatedUser;
use crate::error::AppError;

/// HttpOnly cookie carrying a token, scoped to the whole site
pub fn token_cookie(name: &str, token: &str) -> Cookie<'static> {
    Cookie::build(name.to_string(), token.to_string())
        .path("/")
        .http_only(true)
        .finish()
}

/// Cookie that makes the client drop `name`
pub fn expired_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = token_cookie(name, "");
    cookie.make_removal();
    cookie
}

/// Gate for routes that require a valid token pair
///
/// Missing cookies count as invalid tokens.
pub struct TokenGate {
    auth: AuthService,
    http: HttpSettings,
}

impl TokenGate {
    pub fn new(auth: AuthService, http: HttpSettings) -> Self {
        Self { auth, http }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(TokenGateService {
            service: Rc::new(service),
            auth: self.auth.clone(),
            http: self.http.clone(),
        }))
    }
}

pub struct TokenGateService<S> {
    service: Rc<S>,
    auth: AuthService,
    http: HttpSettings,
}

impl<S> TokenGateService<S> {
    fn cookie_value(&self, req: &ServiceRequest, name: &str) -> String {
        req.cookie(name)
            .map(|c| c.value().to_string())
            .unwrap_or_default()
    }
}

impl<S, B> Service<ServiceRequest> for TokenGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let access_token = self.cookie_value(&req, &self.http.access_cookie_name);
        let refresh_token = self.cookie_value(&req, &self.http.refresh_cookie_name);

        match resolve(&self.auth, &access_token, &refresh_token) {
            Ok(outcome) => {
                req.extensions_mut()
                    .insert(AuthenticatedUser::new(outcome.login()));

                let rotated = outcome.rotated_tokens().map(|tokens| {
                    [
                        token_cookie(&self.http.access_cookie_name, &tokens.access_token),
                        token_cookie(&self.http.refresh_cookie_name, &tokens.refresh_token),
                    ]
                });

                let service = self.service.clone();
                Box::pin(async move {
                    let mut res = service.call(req).await?;
                    if let Some(cookies) = rotated {
                        for cookie in &cookies {
                            res.response_mut().add_cookie(cookie)?;
                        }
                    }
                    Ok(res)
                })
            }
            Err(e) => {
                tracing::debug!(path = %req.path(), error = %e, "Token gate rejected request");
                let err = AppError::from(e);
                Box::pin(async move { Err(err.into()) })
            }
        }
    }
}
