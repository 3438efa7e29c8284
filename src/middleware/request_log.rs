use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use log::{info, warn};
use std::rc::Rc;
use std::time::Instant;

use crate::error::{AppError, ErrorHandler};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID for the current request, taken from `X-Request-ID` or generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_request(req: &ServiceRequest) -> Self {
        let id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        RequestId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Render an `AppError` body whose `error_id` is the request ID
fn render_app_error(err: &AppError, request_id: &RequestId) -> HttpResponse {
    err.log_error(request_id.as_str());
    let (status, body) = <AppError as ErrorHandler>::error_response(err, request_id.as_str());
    HttpResponse::build(status).json(body)
}

/// Re-render a handler's `AppError` response so its body carries the request ID
fn stamp_error_response<B>(
    res: ServiceResponse<B>,
    request_id: &RequestId,
) -> ServiceResponse<EitherBody<B>> {
    let rendered = res
        .response()
        .error()
        .and_then(|e| e.as_error::<AppError>())
        .map(|err| render_app_error(err, request_id));

    match rendered {
        Some(response) => {
            let (req, _) = res.into_parts();
            ServiceResponse::new(req, response).map_into_right_body()
        }
        None => res.map_into_left_body(),
    }
}

/// Request logging middleware
///
/// Assigns the `RequestId`, echoes it in the response header and logs method,
/// path, status and duration of every request. Errors from inner services are
/// turned into responses here so they carry the header too.
pub struct LoggerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for LoggerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(LoggerMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for LoggerMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let request_id = RequestId::from_request(&req);

        info!("Request started: {} {} [{}]", method, path, request_id.as_str());
        req.extensions_mut().insert(request_id.clone());
        let http_req = req.request().clone();

        let service = self.service.clone();

        Box::pin(async move {
            let mut res = match service.call(req).await {
                Ok(res) => stamp_error_response(res, &request_id),
                Err(err) => {
                    warn!(
                        "Request failed: {} {} - Status: {} ({}ms) [{}]",
                        method,
                        path,
                        err.as_response_error().status_code().as_u16(),
                        start_time.elapsed().as_millis(),
                        request_id.as_str()
                    );
                    let rendered = err
                        .as_error::<AppError>()
                        .map(|app_err| render_app_error(app_err, &request_id));
                    let response = rendered.unwrap_or_else(|| HttpResponse::from_error(err));
                    ServiceResponse::new(http_req, response).map_into_right_body()
                }
            };

            if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                res.headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }

            info!(
                "Request completed: {} {} - Status: {} ({}ms) [{}]",
                method,
                path,
                res.status().as_u16(),
                start_time.elapsed().as_millis(),
                request_id.as_str()
            );

            Ok(res)
        })
    }
}
