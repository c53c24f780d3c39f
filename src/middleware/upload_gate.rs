use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::config;
use crate::error::ApiError;

/// Conditional gate for the image upload route.
///
/// Uploads that originate from the registration flow (matched by Referer
/// against a configured allow-list) run unauthenticated so that a new user
/// can attach an avatar before owning a token. Every other request goes
/// through the full bearer-token check.
pub async fn upload_gate(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if referer_is_registration_flow(&headers) {
        tracing::debug!("upload gate bypassed for registration-flow referer");
        return Ok(next.run(request).await);
    }

    super::auth::authenticate(&headers, &mut request)?;
    Ok(next.run(request).await)
}

fn referer_is_registration_flow(headers: &HeaderMap) -> bool {
    let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) else {
        return false;
    };

    config::config()
        .security
        .upload_exempt_referrers
        .iter()
        .any(|allowed| referer.contains(allowed.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_referer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn registration_referer_is_exempt() {
        let headers = headers_with_referer("http://localhost:5173/registro");
        assert!(referer_is_registration_flow(&headers));
    }

    #[test]
    fn other_referers_are_not_exempt() {
        let headers = headers_with_referer("http://localhost:5173/perfil");
        assert!(!referer_is_registration_flow(&headers));
        assert!(!referer_is_registration_flow(&HeaderMap::new()));
    }
}
