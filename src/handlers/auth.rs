//! Login and token refresh endpoints.

use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::auth;
use crate::error::ApiError;

use super::records::repository;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// POST /api/auth/login - exchange credentials for a token pair
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let repo = repository("usuarios").await?;

    let matches = repo
        .find_by_field("email", &Value::String(payload.email.clone()))
        .await?;
    let user = matches
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::unauthorized("invalid credentials"))?;

    let stored = user.get("password").and_then(Value::as_str).unwrap_or_default();
    if !password_matches(&payload.password, stored) {
        tracing::debug!("login rejected for {}", payload.email);
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let id = user
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| ApiError::internal("user record has no id"))?;

    let access_token = auth::issue_access_token(id, &payload.email)?;
    let refresh_token = auth::issue_refresh_token(id, &payload.email)?;

    Ok(Json(json!({
        "accessToken": access_token,
        "refreshToken": refresh_token,
    })))
}

/// POST /api/auth/refresh - trade a refresh token for a short-lived access token
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<impl IntoResponse, ApiError> {
    let claims = auth::verify_refresh_token(&payload.refresh_token)
        .map_err(|_| ApiError::forbidden("refresh token invalid or expired"))?;

    let access_token = auth::issue_refreshed_access_token(claims.id, &claims.email)?;

    Ok(Json(json!({ "accessToken": access_token })))
}

fn password_matches(candidate: &str, stored_digest: &str) -> bool {
    sha256_hex(candidate) == stored_digest
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("abc")
    const ABC_DIGEST: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn digest_comparison_accepts_the_right_password() {
        assert_eq!(sha256_hex("abc"), ABC_DIGEST);
        assert!(password_matches("abc", ABC_DIGEST));
    }

    #[test]
    fn digest_comparison_rejects_everything_else() {
        assert!(!password_matches("abd", ABC_DIGEST));
        assert!(!password_matches("abc", ""));
        assert!(!password_matches("", ABC_DIGEST));
    }
}
