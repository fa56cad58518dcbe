//! # Scanlearn Auth
//!
//! Request gating for the Scanlearn API.
//!
//! This crate decides, before any handler runs, whether a request may proceed:
//!
//! - [`policy`]: Ordered path rules mapping routes to a required [`Tier`]
//! - [`session`]: The [`SessionProvider`] seam and cookie directives for refreshed sessions
//! - [`directory`]: The [`UserDirectory`] seam resolving a user's [`Role`]
//! - [`gate`]: [`AccessGate::evaluate`], the decision function layered over both seams
//! - [`jwt`] / [`claims`]: A cookie-backed JWT [`SessionProvider`] with token rotation
//!
//! # Evaluation Order
//!
//! 1. Resolve (and possibly refresh) the session from request cookies
//! 2. Collect every policy rule matching the path and method
//! 3. `Authenticated` rule and no session: 401
//! 4. `Admin` rule, session present, role is not admin: 403
//! 5. Mutating method, `TeacherOrAdmin` rule, session present, role is neither: 403
//! 6. Otherwise allow
//!
//! Refreshed cookies travel with the decision whatever the verdict.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scanlearn_auth::{AccessGate, GateRequest, GateSettings, InMemoryUserDirectory, PolicyTable};
//!
//! let gate = AccessGate::new(
//!     Arc::new(PolicyTable::builtin()),
//!     Arc::new(provider),
//!     Arc::new(InMemoryUserDirectory::new()),
//!     GateSettings::default(),
//! );
//!
//! let decision = gate.evaluate(&GateRequest::new(Method::GET, "/api/scans")).await;
//! ```

pub mod claims;
pub mod directory;
pub mod gate;
pub mod jwt;
pub mod policy;
pub mod session;

// Re-export commonly used types at crate root
pub use claims::{AccessClaims, RefreshClaims};
pub use directory::{DirectoryError, InMemoryUserDirectory, Role, UserDirectory};
pub use gate::{
    AccessGate, Decision, Denial, GateRequest, GateSettings, GateSettingsError, Verdict,
};
pub use jwt::{
    JwtSessionProvider, TokenError, create_access_token, create_refresh_token,
    rotate_refresh_token, verify_access_token, verify_refresh_token,
};
pub use policy::{Classification, PolicyError, PolicyRule, PolicyTable, Tier};
pub use session::{
    CookieAttributes, CookieDirective, RequestCookies, SameSitePolicy, Session, SessionError,
    SessionProvider, SessionResolution,
};
