use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;

/// Identity assertion carried by both token variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: i64, email: &str, ttl_secs: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id,
            email: email.to_string(),
            iat: now,
            exp: now + ttl_secs as i64,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    MissingSecret,
    Generation(String),
    InvalidOrExpired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::MissingSecret => write!(f, "signing secret not configured"),
            TokenError::Generation(msg) => write!(f, "token generation error: {}", msg),
            TokenError::InvalidOrExpired => write!(f, "token invalid or expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Access token issued at login, ttl 1 hour.
pub fn issue_access_token(id: i64, email: &str) -> Result<String, TokenError> {
    let security = &config::config().security;
    sign(Claims::new(id, email, security.access_ttl_secs), &security.access_secret)
}

/// Access token reissued through the refresh flow, ttl 10 minutes.
pub fn issue_refreshed_access_token(id: i64, email: &str) -> Result<String, TokenError> {
    let security = &config::config().security;
    sign(Claims::new(id, email, security.refreshed_access_ttl_secs), &security.access_secret)
}

/// Refresh token with its own secret, ttl 7 days.
pub fn issue_refresh_token(id: i64, email: &str) -> Result<String, TokenError> {
    let security = &config::config().security;
    sign(Claims::new(id, email, security.refresh_ttl_secs), &security.refresh_secret)
}

pub fn verify_access_token(token: &str) -> Result<Claims, TokenError> {
    verify(token, &config::config().security.access_secret)
}

pub fn verify_refresh_token(token: &str) -> Result<Claims, TokenError> {
    verify(token, &config::config().security.refresh_secret)
}

fn sign(claims: Claims, secret: &str) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| TokenError::Generation(e.to_string()))
}

// Bad signature and expiry are deliberately collapsed into one variant; only
// the user-facing message distinguishes them.
fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| TokenError::InvalidOrExpired)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[test]
    fn sign_and_verify_roundtrip() {
        let token = sign(Claims::new(7, "ana@example.com", 3600), SECRET).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = Claims::new(7, "ana@example.com", 3600);
        claims.iat -= 7200;
        claims.exp -= 7200;
        let token = sign(claims, SECRET).unwrap();
        assert_eq!(verify(&token, SECRET), Err(TokenError::InvalidOrExpired));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign(Claims::new(7, "ana@example.com", 3600), SECRET).unwrap();
        assert_eq!(verify(&token, "other-secret"), Err(TokenError::InvalidOrExpired));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(
            sign(Claims::new(1, "a@b.c", 60), ""),
            Err(TokenError::MissingSecret)
        );
        assert_eq!(verify("whatever", ""), Err(TokenError::MissingSecret));
    }

    #[test]
    fn refresh_claims_carry_over_to_new_access_token() {
        let refresh = sign(Claims::new(42, "luis@example.com", 604800), SECRET).unwrap();
        let claims = verify(&refresh, SECRET).unwrap();
        let reissued = sign(Claims::new(claims.id, &claims.email, 600), SECRET).unwrap();
        let reissued_claims = verify(&reissued, SECRET).unwrap();
        assert_eq!(reissued_claims.id, 42);
        assert_eq!(reissued_claims.email, "luis@example.com");
        assert_eq!(reissued_claims.exp - reissued_claims.iat, 600);
    }
}
