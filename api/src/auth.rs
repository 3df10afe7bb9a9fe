use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

const BEARER_SCHEME: &str = "bearer";

/// The single shared secret every caller presents.
#[derive(Clone)]
pub struct ServiceToken(String);

impl ServiceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Constant-time, byte-for-byte comparison.
    pub fn matches(&self, presented: &str) -> bool {
        self.0.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

impl std::fmt::Debug for ServiceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ServiceToken(***)")
    }
}

/// Splits `Authorization: <scheme> <credentials>` and returns the credentials
/// when the scheme is `Bearer`, compared case-insensitively.
pub fn bearer_credentials(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credentials) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    Some(credentials)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match bearer_credentials(&headers) {
        Some(token) if state.token.matches(token) => Ok(next.run(request).await),
        Some(_) => {
            log::warn!("Rejected request to {}: invalid bearer token", request.uri().path());
            Err(ApiError::Unauthorized)
        }
        None => {
            log::warn!("Rejected request to {}: missing bearer token", request.uri().path());
            Err(ApiError::Unauthorized)
        }
    }
}
