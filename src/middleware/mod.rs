/// Middleware module
///
/// The cookie-based token gate for protected routes, plus request ID and
/// request logging.

mod request_log;
mod token_gate;

pub use request_log::{LoggerMiddleware, RequestId};
pub use token_gate::{expired_cookie, token_cookie, TokenGate};
