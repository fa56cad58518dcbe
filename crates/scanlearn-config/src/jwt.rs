use std::env;

/// Session token configuration.
///
/// # Environment Variables
///
/// - `JWT_SECRET`: HMAC signing secret
/// - `JWT_ACCESS_EXPIRY`: access token lifetime in seconds (default: 3600)
/// - `JWT_REFRESH_EXPIRY`: refresh token lifetime in seconds (default: 604800)
/// - `JWT_REFRESH_WINDOW`: rotate access tokens expiring within this many seconds (default: 300)
/// - `SESSION_COOKIE_NAME`: access token cookie (default: `sl-access-token`)
/// - `REFRESH_COOKIE_NAME`: refresh token cookie (default: `sl-refresh-token`)
/// - `COOKIE_SECURE`: mark session cookies `Secure` (default: true)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub refresh_window: i64,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    pub secure_cookies: bool,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "your-secret-key-change-in-production".to_string(),
            access_token_expiry: 3600,   // 1 hour
            refresh_token_expiry: 604800, // 7 days
            refresh_window: 300,
            access_cookie_name: "sl-access-token".to_string(),
            refresh_cookie_name: "sl-refresh-token".to_string(),
            secure_cookies: true,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: env::var("JWT_ACCESS_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.access_token_expiry),
            refresh_token_expiry: env::var("JWT_REFRESH_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.refresh_token_expiry),
            refresh_window: env::var("JWT_REFRESH_WINDOW")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.refresh_window),
            access_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.access_cookie_name),
            refresh_cookie_name: env::var("REFRESH_COOKIE_NAME")
                .unwrap_or(defaults.refresh_cookie_name),
            secure_cookies: env::var("COOKIE_SECURE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.secure_cookies),
        }
    }
}
