/// Authentication module
///
/// Password hashing, JWT issuance/validation, the authentication service and
/// the dual-token refresh protocol.

mod claims;
mod jwt;
mod password;
pub mod refresh;
mod service;

pub use claims::Claims;
pub use jwt::decode_claims;
pub use jwt::issue_token;
pub use jwt::parse_token;
pub use password::hash_password;
pub use password::hash_password_with_cost;
pub use password::verify_password;
pub use password::MIN_COST;
pub use refresh::{resolve, RefreshError, RefreshOutcome, RefreshState, ValidationStatus};
pub use service::AuthService;
