use axum::{
    extract::Request,
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
        }
    }
}

/// Authentication middleware guarding the `/api` surface.
///
/// Requires `Authorization: Bearer <token>`; on success the decoded identity
/// is injected into request extensions for downstream handlers. Signup is the
/// single exempt route so that unauthenticated account creation stays
/// possible.
pub async fn require_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_gate_exempt(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    authenticate(&headers, &mut request)?;
    Ok(next.run(request).await)
}

/// Verify the bearer token in `headers` and inject [`AuthUser`] into
/// `request`. Shared with the conditional upload gate.
pub(crate) fn authenticate(headers: &HeaderMap, request: &mut Request) -> Result<(), ApiError> {
    let token =
        extract_bearer(headers).ok_or_else(|| ApiError::unauthorized("token not provided"))?;

    let claims = auth::verify_access_token(&token)
        .map_err(|_| ApiError::unauthorized("token invalid or expired"))?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(())
}

fn is_gate_exempt(method: &Method, path: &str) -> bool {
    // Unauthenticated signup
    *method == Method::POST && path == "/api/usuarios"
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// A missing header and a malformed value are treated alike.
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }

    #[test]
    fn malformed_values_yield_none() {
        assert_eq!(extract_bearer(&headers_with_auth("abc.def.ghi")), None);
        assert_eq!(extract_bearer(&headers_with_auth("Basic dXNlcg==")), None);
        assert_eq!(extract_bearer(&headers_with_auth("Bearer ")), None);
    }

    #[test]
    fn signup_is_the_only_exempt_route() {
        assert!(is_gate_exempt(&Method::POST, "/api/usuarios"));
        assert!(!is_gate_exempt(&Method::GET, "/api/usuarios"));
        assert!(!is_gate_exempt(&Method::POST, "/api/productos"));
        assert!(!is_gate_exempt(&Method::POST, "/api/usuarios/1"));
    }
}
