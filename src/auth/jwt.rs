/// JWT Token Generation and Validation
///
/// Tokens are HS256-signed JWTs carrying `sub` (login) and `exp`. All state
/// needed to validate one is the token itself plus the shared secret.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::error::{IssueError, ParseError};

/// Algorithms accepted on parse: the HMAC family only
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Issue a signed token for `subject` that lives for `ttl`
///
/// # Errors
/// Checked in this order, so the first invalid input wins:
/// - `EmptySecret` if `secret` is empty
/// - `NonPositiveDuration` if `ttl` is zero or negative
/// - `EmptySubject` if `subject` is empty
/// - `DurationOutOfRange` if `ttl` pushes the expiry past any valid timestamp
pub fn issue_token(
    subject: &str,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<String, IssueError> {
    if secret.is_empty() {
        return Err(IssueError::EmptySecret);
    }
    if ttl <= chrono::Duration::zero() {
        return Err(IssueError::NonPositiveDuration);
    }
    if subject.is_empty() {
        return Err(IssueError::EmptySubject);
    }

    let claims = Claims::new(subject, ttl)?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| IssueError::Signing(e.to_string()))
}

/// Validate a token and return its subject
///
/// # Errors
/// - `SignatureInvalid` if the MAC doesn't match or the header names a
///   non-HMAC algorithm
/// - `Expired` if the embedded expiry has passed
/// - `Malformed` if the token can't be decoded or has no subject
pub fn parse_token(token: &str, secret: &str) -> Result<String, ParseError> {
    decode_claims(token, secret).map(|claims| claims.sub)
}

/// Validate a token and return its full claims
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, ParseError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = HMAC_ALGORITHMS.to_vec();
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => ParseError::SignatureInvalid,
        ErrorKind::ExpiredSignature => ParseError::Expired,
        _ => ParseError::Malformed(e.to_string()),
    })?;

    if claims.sub.is_empty() {
        return Err(ParseError::Malformed("token has an empty subject".to_string()));
    }

    Ok(claims)
}
