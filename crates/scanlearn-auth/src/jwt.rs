//! JWT session tokens and the cookie-backed [`JwtSessionProvider`].
//!
//! Sessions live in two cookies: a short-lived access token and a long-lived
//! refresh token. Resolution follows these rules:
//!
//! - **Valid access token**: session active. If it expires within
//!   `refresh_window` seconds, a fresh access token is issued.
//! - **Expired or missing access token, valid refresh token**: both tokens are
//!   re-issued.
//! - **Nothing usable**: no session, and any stale cookie is cleared.
//!
//! Expiry is checked against the caller-supplied `now`, so rotation is
//! deterministic for a given clock reading.
//!
//! # Example
//!
//! ```ignore
//! use scanlearn_auth::jwt::{create_access_token, verify_access_token};
//! use scanlearn_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let now = chrono::Utc::now().timestamp();
//!
//! let token = create_access_token("5b0c...", &config, now)?;
//! let claims = verify_access_token(&token, &config, now)?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use scanlearn_config::JwtConfig;

use crate::claims::{ACCESS_TOKEN_USE, AccessClaims, REFRESH_TOKEN_USE, RefreshClaims};
use crate::session::{
    CookieAttributes, CookieDirective, RequestCookies, SameSitePolicy, Session, SessionError,
    SessionProvider, SessionResolution,
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or has an invalid signature")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token is not a {expected} token")]
    WrongUse { expected: &'static str },

    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl From<TokenError> for SessionError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(msg) => SessionError::Issuance(msg),
            _ => SessionError::Malformed,
        }
    }
}

fn sign<T: Serialize>(claims: &T, jwt_config: &JwtConfig) -> Result<String, TokenError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

fn decode_unexpired<T: DeserializeOwned>(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<T, TokenError> {
    // expiry is checked by the caller against its own clock
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    decode::<T>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::Malformed)
}

/// Creates an access token for `user_id` issued at `now`.
pub fn create_access_token(
    user_id: &str,
    jwt_config: &JwtConfig,
    now: i64,
) -> Result<String, TokenError> {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        token_use: ACCESS_TOKEN_USE.to_string(),
        exp: now + jwt_config.access_token_expiry,
        iat: now,
    };

    sign(&claims, jwt_config)
}

/// Token id derived from the subject, issue time and the token it replaces,
/// so re-issuing from the same inputs yields the same token.
fn refresh_jti(user_id: &str, now: i64, previous: Option<&str>) -> String {
    let name = format!("{user_id}:{now}:{}", previous.unwrap_or_default());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

fn issue_refresh_token(
    user_id: &str,
    jwt_config: &JwtConfig,
    now: i64,
    previous: Option<&str>,
) -> Result<String, TokenError> {
    let claims = RefreshClaims {
        sub: user_id.to_string(),
        token_use: REFRESH_TOKEN_USE.to_string(),
        exp: now + jwt_config.refresh_token_expiry,
        iat: now,
        jti: refresh_jti(user_id, now, previous),
    };

    sign(&claims, jwt_config)
}

/// Creates a refresh token for `user_id` issued at `now`.
pub fn create_refresh_token(
    user_id: &str,
    jwt_config: &JwtConfig,
    now: i64,
) -> Result<String, TokenError> {
    issue_refresh_token(user_id, jwt_config, now, None)
}

/// Replaces `previous` with a refresh token issued at `now`.
pub fn rotate_refresh_token(
    previous: &RefreshClaims,
    jwt_config: &JwtConfig,
    now: i64,
) -> Result<String, TokenError> {
    issue_refresh_token(&previous.sub, jwt_config, now, Some(&previous.jti))
}

/// Verifies an access token's signature, purpose and expiry at `now`.
pub fn verify_access_token(
    token: &str,
    jwt_config: &JwtConfig,
    now: i64,
) -> Result<AccessClaims, TokenError> {
    let claims: AccessClaims = decode_unexpired(token, jwt_config)?;

    if claims.token_use != ACCESS_TOKEN_USE {
        return Err(TokenError::WrongUse {
            expected: ACCESS_TOKEN_USE,
        });
    }
    if claims.exp <= now {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Verifies a refresh token's signature, purpose and expiry at `now`.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
    now: i64,
) -> Result<RefreshClaims, TokenError> {
    let claims: RefreshClaims = decode_unexpired(token, jwt_config)?;

    if claims.token_use != REFRESH_TOKEN_USE {
        return Err(TokenError::WrongUse {
            expected: REFRESH_TOKEN_USE,
        });
    }
    if claims.exp <= now {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// [`SessionProvider`] backed by signed JWT cookies.
#[derive(Debug, Clone)]
pub struct JwtSessionProvider {
    config: JwtConfig,
}

impl JwtSessionProvider {
    /// A refresh window outside `0..access_token_expiry` is clamped into it.
    pub fn new(mut config: JwtConfig) -> Self {
        let max_window = (config.access_token_expiry - 1).max(0);
        if !(0..=max_window).contains(&config.refresh_window) {
            warn!(
                refresh_window = config.refresh_window,
                access_token_expiry = config.access_token_expiry,
                "JWT_REFRESH_WINDOW out of range; clamping"
            );
            config.refresh_window = config.refresh_window.clamp(0, max_window);
        }

        Self { config }
    }

    fn cookie_attributes(&self, max_age: i64) -> CookieAttributes {
        CookieAttributes {
            path: "/".to_string(),
            max_age: Some(max_age),
            http_only: true,
            secure: self.config.secure_cookies,
            same_site: SameSitePolicy::Lax,
        }
    }

    fn access_cookie(&self, token: &str) -> CookieDirective {
        CookieDirective::set(
            &self.config.access_cookie_name,
            token,
            self.cookie_attributes(self.config.access_token_expiry),
        )
    }

    fn refresh_cookie(&self, token: &str) -> CookieDirective {
        CookieDirective::set(
            &self.config.refresh_cookie_name,
            token,
            self.cookie_attributes(self.config.refresh_token_expiry),
        )
    }

    /// Resolves the session as of `now` (Unix seconds).
    pub fn resolve_at(
        &self,
        cookies: &RequestCookies,
        now: i64,
    ) -> Result<SessionResolution, SessionError> {
        let access = cookies.get(&self.config.access_cookie_name);
        let refresh = cookies.get(&self.config.refresh_cookie_name);

        if let Some(token) = access {
            match verify_access_token(token, &self.config, now) {
                Ok(claims) if claims.exp - now > self.config.refresh_window => {
                    return Ok(SessionResolution::active(Session {
                        user_id: claims.sub,
                        access_token: token.clone(),
                    }));
                }
                Ok(claims) => {
                    debug!(user_id = %claims.sub, "rotating access token close to expiry");
                    let rotated = create_access_token(&claims.sub, &self.config, now)?;
                    let cookie = self.access_cookie(&rotated);
                    return Ok(SessionResolution::active(Session {
                        user_id: claims.sub,
                        access_token: rotated,
                    })
                    .with_cookie(cookie));
                }
                Err(err) => debug!(error = %err, "access token unusable"),
            }
        }

        if let Some(token) = refresh {
            match verify_refresh_token(token, &self.config, now) {
                Ok(claims) => {
                    debug!(user_id = %claims.sub, "re-issuing session from refresh token");
                    let access_token = create_access_token(&claims.sub, &self.config, now)?;
                    let refresh_token = rotate_refresh_token(&claims, &self.config, now)?;
                    let access_cookie = self.access_cookie(&access_token);
                    return Ok(SessionResolution::active(Session {
                        user_id: claims.sub,
                        access_token,
                    })
                    .with_cookie(access_cookie)
                    .with_cookie(self.refresh_cookie(&refresh_token)));
                }
                Err(err) => debug!(error = %err, "refresh token unusable"),
            }
        }

        let mut resolution = SessionResolution::anonymous();
        if access.is_some() {
            resolution = resolution.with_cookie(CookieDirective::remove(
                &self.config.access_cookie_name,
                self.cookie_attributes(0),
            ));
        }
        if refresh.is_some() {
            resolution = resolution.with_cookie(CookieDirective::remove(
                &self.config.refresh_cookie_name,
                self.cookie_attributes(0),
            ));
        }

        Ok(resolution)
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn resolve(&self, cookies: &RequestCookies) -> Result<SessionResolution, SessionError> {
        self.resolve_at(cookies, Utc::now().timestamp())
    }
}
