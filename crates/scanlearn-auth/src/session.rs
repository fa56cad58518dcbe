//! Session resolution seam.
//!
//! The identity provider sits behind [`SessionProvider`]. Resolving a session may
//! rotate its token material; the provider reports that as [`CookieDirective`]s
//! which the caller must write back to both the inbound request and the outbound
//! response.

use std::collections::BTreeMap;

use async_trait::async_trait;

/// Cookies sent with the inbound request, by name.
pub type RequestCookies = BTreeMap<String, String>;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    /// Token currently backing the session, after any rotation.
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: String,
    /// Lifetime in seconds; `Some(0)` expires the cookie immediately.
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: true,
            same_site: SameSitePolicy::Lax,
        }
    }
}

/// A cookie write the caller must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDirective {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

impl CookieDirective {
    pub fn set(
        name: impl Into<String>,
        value: impl Into<String>,
        attributes: CookieAttributes,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes,
        }
    }

    /// Clears `name` on the client: empty value, `Max-Age=0`.
    pub fn remove(name: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            attributes: CookieAttributes {
                max_age: Some(0),
                ..attributes
            },
        }
    }

    pub fn is_removal(&self) -> bool {
        self.value.is_empty() && self.attributes.max_age == Some(0)
    }
}

/// Outcome of a session lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResolution {
    pub session: Option<Session>,
    pub cookies: Vec<CookieDirective>,
}

impl SessionResolution {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn active(session: Session) -> Self {
        Self {
            session: Some(session),
            cookies: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: CookieDirective) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn is_refreshed(&self) -> bool {
        self.cookies.iter().any(|c| !c.is_removal())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,

    #[error("failed to issue session token: {0}")]
    Issuance(String),

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the caller's session from request cookies.
///
/// Implementations may rotate tokens; any rotation must be reported in
/// [`SessionResolution::cookies`]. Errors are treated by the gate as "no session".
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn resolve(&self, cookies: &RequestCookies) -> Result<SessionResolution, SessionError>;
}
