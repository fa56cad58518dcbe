//! JWT claim structures for session tokens.
//!
//! - [`AccessClaims`]: short-lived token backing a session
//! - [`RefreshClaims`]: long-lived token used to re-issue access tokens

use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_USE: &str = "access";
pub const REFRESH_TOKEN_USE: &str = "refresh";

/// JWT claims for access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// Always [`ACCESS_TOKEN_USE`]
    pub token_use: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: i64,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: i64,
}

/// JWT claims for refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// Always [`REFRESH_TOKEN_USE`]
    pub token_use: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: i64,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: i64,
    /// Unique token identifier (JWT ID) to ensure token uniqueness
    pub jti: String,
}
