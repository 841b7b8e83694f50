//! Authentication middleware
//!
//! Staff tooling authenticates with API keys (`X-Api-Key` or a bearer
//! token); the key's configured role decides the caller's permission set.
//! The applicant portal and the health endpoint sit outside this layer.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::middleware::permissions::{has_permission, Permission};
use crate::ApiState;

/// Authenticated caller, inserted into request extensions by [`require_api_key`]
#[derive(Clone, Debug)]
pub struct Caller {
    pub permissions: HashSet<Permission>,
}

impl Caller {
    /// Whether the caller holds the permission
    pub fn holds(&self, permission: Permission) -> bool {
        has_permission(&self.permissions, permission)
    }

    /// Reject with 403 unless the caller holds the permission
    pub fn require(&self, permission: Permission) -> Result<(), StatusCode> {
        if self.holds(permission) {
            Ok(())
        } else {
            Err(StatusCode::FORBIDDEN)
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Caller {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// API-key gate for the `/api/v1` surface
///
/// With no keys configured the API runs open (local development) and every
/// caller gets the full permission set.
pub async fn require_api_key(
    State(state): State<Arc<ApiState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.api_keys.is_empty() {
        request.extensions_mut().insert(Caller { permissions: Permission::all() });
        return Ok(next.run(request).await);
    }

    let key = extract_key(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let role = *state.config.api_keys.get(&key).ok_or(StatusCode::UNAUTHORIZED)?;

    if !state.limiter.check(&key) {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }

    request.extensions_mut().insert(Caller { permissions: Permission::for_role(role) });
    Ok(next.run(request).await)
}

fn extract_key(headers: &HeaderMap) -> Option<String> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_key_prefers_dedicated_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer zzz"));
        assert_eq!(extract_key(&headers), Some("abc".into()));
    }

    #[test]
    fn test_extract_key_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer zzz"));
        assert_eq!(extract_key(&headers), Some("zzz".into()));
        assert_eq!(extract_key(&HeaderMap::new()), None);
    }

    #[test]
    fn test_caller_permission_gate() {
        let caller = Caller { permissions: Permission::for_role(letters_core::UserRole::Applicant) };
        assert!(caller.require(Permission::LettersRead).is_ok());
        assert_eq!(caller.require(Permission::LettersWrite), Err(StatusCode::FORBIDDEN));
    }
}
