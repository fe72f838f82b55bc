//! Configuration module
//!
//! Environment-driven configuration for the API binary. Everything is read
//! once at startup via [`Config::from_env`] and validated before the server
//! binds. Absence of `DATABASE_URL` selects the in-memory content store;
//! absence of any ImageKit variable disables the CDN features gracefully.

use std::env;

// Common constants
const SERVER_PORT: u16 = 5000;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_FILE_SIZE_BYTES: usize = 2 * 1024 * 1024 * 1024; // 2 GiB
const MAX_PASSWORD_LENGTH: usize = 100;
const MAX_FAILED_ATTEMPTS: u32 = 5;
const LOCKOUT_WINDOW_SECS: u64 = 15 * 60;
const LOCKOUT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;
const RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const RATE_LIMIT_MAX_REQUESTS: u32 = 100;
// Above the lockout threshold so the lockout state machine, with its
// machine-readable ACCOUNT_LOCKED code, is the deciding control for login.
const LOGIN_RATE_LIMIT_MAX_REQUESTS: u32 = 20;
const FAILED_LOGIN_DELAY_MS: u64 = 2000;
const IMAGEKIT_TIMEOUT_SECS: u64 = 30;

/// Remote CDN (ImageKit) credentials and endpoint.
#[derive(Clone, Debug)]
pub struct CdnConfig {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
    pub timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,

    /// Relational store connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,

    pub admin_password: String,
    pub jwt_secret: String,
    pub session_secret: Option<String>,
    pub jwt_expiry_hours: i64,
    pub max_password_length: usize,

    pub max_failed_attempts: u32,
    pub lockout_window_secs: u64,
    pub lockout_sweep_interval_secs: u64,
    pub failed_login_delay_ms: u64,

    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: u32,
    pub login_rate_limit_max_requests: u32,

    pub upload_dir: String,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,

    pub cdn: Option<CdnConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let admin_password = env::var("ADMIN_PASSWORD")
            .map_err(|_| anyhow::anyhow!("ADMIN_PASSWORD must be set"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let cdn = match (
            env::var("IMAGEKIT_PUBLIC_KEY"),
            env::var("IMAGEKIT_PRIVATE_KEY"),
            env::var("IMAGEKIT_URL_ENDPOINT"),
        ) {
            (Ok(public_key), Ok(private_key), Ok(url_endpoint)) => Some(CdnConfig {
                public_key,
                private_key,
                url_endpoint,
                timeout_secs: parse_env("IMAGEKIT_TIMEOUT_SECS", IMAGEKIT_TIMEOUT_SECS),
            }),
            _ => None,
        };

        Ok(Config {
            server_port: parse_env("PORT", SERVER_PORT),
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL").ok(),
            admin_password,
            jwt_secret,
            session_secret: env::var("SESSION_SECRET").ok(),
            jwt_expiry_hours: parse_env("JWT_EXPIRY_HOURS", JWT_EXPIRY_HOURS),
            max_password_length: MAX_PASSWORD_LENGTH,
            max_failed_attempts: parse_env("MAX_FAILED_ATTEMPTS", MAX_FAILED_ATTEMPTS),
            lockout_window_secs: parse_env("LOCKOUT_WINDOW_SECS", LOCKOUT_WINDOW_SECS),
            lockout_sweep_interval_secs: LOCKOUT_SWEEP_INTERVAL_SECS,
            failed_login_delay_ms: parse_env("FAILED_LOGIN_DELAY_MS", FAILED_LOGIN_DELAY_MS),
            rate_limit_window_secs: RATE_LIMIT_WINDOW_SECS,
            rate_limit_max_requests: parse_env("RATE_LIMIT_MAX_REQUESTS", RATE_LIMIT_MAX_REQUESTS),
            login_rate_limit_max_requests: parse_env(
                "LOGIN_RATE_LIMIT_MAX_REQUESTS",
                LOGIN_RATE_LIMIT_MAX_REQUESTS,
            ),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_file_size_bytes: parse_env("MAX_FILE_SIZE_BYTES", MAX_FILE_SIZE_BYTES),
            allowed_content_types: default_allowed_content_types(),
            cdn,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn cdn_configured(&self) -> bool {
        self.cdn.is_some()
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin_password.is_empty() {
            return Err(anyhow::anyhow!("ADMIN_PASSWORD cannot be empty"));
        }
        if self.admin_password.len() > self.max_password_length {
            return Err(anyhow::anyhow!(
                "ADMIN_PASSWORD exceeds the maximum length of {} characters",
                self.max_password_length
            ));
        }
        if self.is_production() && self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters in production"
            ));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be positive"));
        }
        if self.max_failed_attempts == 0 {
            return Err(anyhow::anyhow!("MAX_FAILED_ATTEMPTS must be positive"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// The MIME allow-list for uploads: image, video, audio, and document formats.
fn default_allowed_content_types() -> Vec<String> {
    [
        // Images
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/tiff",
        "image/bmp",
        "image/svg+xml",
        "image/avif",
        "image/heic",
        "image/heif",
        // Documents
        "application/pdf",
        "text/plain",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        // Video
        "video/mp4",
        "video/webm",
        "video/ogg",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-matroska",
        "video/mp2t",
        "video/3gpp",
        "video/x-flv",
        "video/x-ms-wmv",
        // Audio
        "audio/mpeg",
        "audio/mp3",
        "audio/wav",
        "audio/x-wav",
        "audio/ogg",
        "audio/flac",
        "audio/aac",
        "audio/x-aiff",
        "audio/x-m4a",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 5000,
            environment: "development".to_string(),
            cors_origins: vec![],
            database_url: None,
            admin_password: "correct horse battery staple".to_string(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            session_secret: None,
            jwt_expiry_hours: 24,
            max_password_length: 100,
            max_failed_attempts: 5,
            lockout_window_secs: 900,
            lockout_sweep_interval_secs: 3600,
            failed_login_delay_ms: 0,
            rate_limit_window_secs: 900,
            rate_limit_max_requests: 100,
            login_rate_limit_max_requests: 20,
            upload_dir: "uploads".to_string(),
            max_file_size_bytes: 1024,
            allowed_content_types: default_allowed_content_types(),
            cdn: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_password() {
        let mut config = test_config();
        config.admin_password = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_secret_in_production() {
        let mut config = test_config();
        config.environment = "production".to_string();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_allow_list_covers_media_families() {
        let types = default_allowed_content_types();
        assert!(types.iter().any(|t| t == "image/png"));
        assert!(types.iter().any(|t| t == "video/mp4"));
        assert!(types.iter().any(|t| t == "audio/mpeg"));
        assert!(types.iter().any(|t| t == "application/pdf"));
        assert!(!types.iter().any(|t| t == "application/x-msdownload"));
    }

    #[test]
    fn test_cdn_configured() {
        let mut config = test_config();
        assert!(!config.cdn_configured());
        config.cdn = Some(CdnConfig {
            public_key: "public_xxx".to_string(),
            private_key: "private_xxx".to_string(),
            url_endpoint: "https://ik.imagekit.io/demo".to_string(),
            timeout_secs: 30,
        });
        assert!(config.cdn_configured());
    }
}
