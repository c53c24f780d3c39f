use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Signing secret for access tokens. Empty means token operations fail.
    pub access_secret: String,
    /// Independent signing secret for refresh tokens.
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    /// Ttl for access tokens reissued through the refresh endpoint.
    pub refreshed_access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    /// Referer substrings that may upload without a token (registration flow).
    pub upload_exempt_referrers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
    /// Subfolders a client may target via the `carpeta` form field.
    pub folders: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::defaults(environment).with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.access_secret = v;
        }
        if let Ok(v) = env::var("JWT_REFRESH_SECRET") {
            self.security.refresh_secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_TTL_SECS") {
            self.security.access_ttl_secs = v.parse().unwrap_or(self.security.access_ttl_secs);
        }
        if let Ok(v) = env::var("JWT_REFRESHED_ACCESS_TTL_SECS") {
            self.security.refreshed_access_ttl_secs =
                v.parse().unwrap_or(self.security.refreshed_access_ttl_secs);
        }
        if let Ok(v) = env::var("JWT_REFRESH_TTL_SECS") {
            self.security.refresh_ttl_secs = v.parse().unwrap_or(self.security.refresh_ttl_secs);
        }
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.upload.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_EXEMPT_REFERRERS") {
            self.security.upload_exempt_referrers =
                v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn defaults(environment: Environment) -> Self {
        Self {
            environment,
            server: ServerConfig { port: 3000 },
            security: SecurityConfig {
                access_secret: String::new(),
                refresh_secret: String::new(),
                access_ttl_secs: 60 * 60,               // 1 hour
                refreshed_access_ttl_secs: 10 * 60,     // 10 minutes
                refresh_ttl_secs: 7 * 24 * 60 * 60,     // 7 days
                upload_exempt_referrers: vec!["/registro".to_string(), "/signup".to_string()],
            },
            upload: UploadConfig {
                dir: "uploads".to_string(),
                max_bytes: 5 * 1024 * 1024, // 5MB
                folders: vec!["productos".to_string(), "servicios".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_ttl_is_shorter_than_refresh_ttl() {
        let config = AppConfig::defaults(Environment::Development);
        assert!(config.security.access_ttl_secs < config.security.refresh_ttl_secs);
        assert!(config.security.refreshed_access_ttl_secs < config.security.access_ttl_secs);
    }

    #[test]
    fn default_upload_limits() {
        let config = AppConfig::defaults(Environment::Production);
        assert_eq!(config.upload.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.upload.folders, vec!["productos", "servicios"]);
    }
}
