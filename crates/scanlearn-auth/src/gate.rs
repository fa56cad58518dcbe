//! The access gate.
//!
//! [`AccessGate::evaluate`] turns a [`GateRequest`] into a [`Decision`]. It is a
//! pure function of the request, the resolved session, the resolved role and the
//! [`PolicyTable`]; the only state it touches lives behind the two collaborators.
//!
//! Collaborator failures never escape: a session provider error or timeout means
//! "no session", a directory error or timeout means "no role". Both fail closed
//! for any rule that needs them.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use tokio::time::timeout;

use scanlearn_config::GateConfig;

use crate::directory::{Role, UserDirectory};
use crate::policy::{Classification, PolicyTable, Tier};
use crate::session::{
    CookieDirective, RequestCookies, Session, SessionProvider, SessionResolution,
};

pub const AUTHENTICATION_REQUIRED: &str = "Authentication required";
pub const ADMIN_ACCESS_REQUIRED: &str = "Admin access required";
pub const TEACHER_OR_ADMIN_ACCESS_REQUIRED: &str = "Teacher or admin access required";

/// Inbound request as seen by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    pub path: String,
    pub method: Method,
    pub cookies: RequestCookies,
}

impl GateRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            cookies: RequestCookies::new(),
        }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    AuthenticationRequired,
    AdminRequired,
    TeacherOrAdminRequired,
}

impl Denial {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Denial::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Denial::AdminRequired | Denial::TeacherOrAdminRequired => StatusCode::FORBIDDEN,
        }
    }

    /// Client-facing message. Clients match on these strings.
    pub fn reason(&self) -> &'static str {
        match self {
            Denial::AuthenticationRequired => AUTHENTICATION_REQUIRED,
            Denial::AdminRequired => ADMIN_ACCESS_REQUIRED,
            Denial::TeacherOrAdminRequired => TEACHER_OR_ADMIN_ACCESS_REQUIRED,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Denial::AuthenticationRequired => "authentication_required",
            Denial::AdminRequired => "admin_required",
            Denial::TeacherOrAdminRequired => "teacher_or_admin_required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(Denial),
}

/// Gate output: a verdict plus the cookie writes the caller must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Written to both the inbound request and the outbound response, in order,
    /// whatever the verdict.
    pub cookies: Vec<CookieDirective>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allow
    }

    pub fn denial(&self) -> Option<Denial> {
        match self.verdict {
            Verdict::Allow => None,
            Verdict::Deny(denial) => Some(denial),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.denial()
            .map(|d| d.status_code())
            .unwrap_or(StatusCode::OK)
    }

    pub fn reason(&self) -> Option<&'static str> {
        self.denial().map(|d| d.reason())
    }

    /// Whether the session provider issued new cookie material.
    pub fn is_refreshed(&self) -> bool {
        self.cookies.iter().any(|c| !c.is_removal())
    }
}

#[derive(Debug, Clone)]
pub struct GateSettings {
    /// Methods subject to the teacher-or-admin check.
    pub mutating_methods: Vec<Method>,
    /// Upper bound on each collaborator call.
    pub collaborator_timeout: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        let config = GateConfig::default();
        Self {
            mutating_methods: vec![Method::POST],
            collaborator_timeout: config.collaborator_timeout,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateSettingsError {
    #[error("invalid HTTP method in mutating methods: {0:?}")]
    InvalidMethod(String),

    #[error("mutating methods must not be empty")]
    NoMutatingMethods,
}

impl GateSettings {
    /// Fails on any unparseable method name and on an empty list.
    pub fn from_config(config: &GateConfig) -> Result<Self, GateSettingsError> {
        let mutating_methods = config
            .mutating_methods
            .iter()
            .map(|m| {
                Method::from_bytes(m.as_bytes())
                    .map_err(|_| GateSettingsError::InvalidMethod(m.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if mutating_methods.is_empty() {
            return Err(GateSettingsError::NoMutatingMethods);
        }

        Ok(Self {
            mutating_methods,
            collaborator_timeout: config.collaborator_timeout,
        })
    }
}

#[derive(Clone)]
pub struct AccessGate {
    policy: Arc<PolicyTable>,
    sessions: Arc<dyn SessionProvider>,
    directory: Arc<dyn UserDirectory>,
    settings: Arc<GateSettings>,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AccessGate {
    pub fn new(
        policy: Arc<PolicyTable>,
        sessions: Arc<dyn SessionProvider>,
        directory: Arc<dyn UserDirectory>,
        settings: GateSettings,
    ) -> Self {
        Self {
            policy,
            sessions,
            directory,
            settings: Arc::new(settings),
        }
    }

    pub async fn evaluate(&self, request: &GateRequest) -> Decision {
        let SessionResolution { session, cookies } = self.resolve_session(&request.cookies).await;
        let classification = self.policy.classify(&request.path, &request.method);
        let verdict = self
            .decide(&request.method, session.as_ref(), &classification)
            .await;

        Decision { verdict, cookies }
    }

    async fn decide(
        &self,
        method: &Method,
        session: Option<&Session>,
        classification: &Classification<'_>,
    ) -> Verdict {
        if classification.requires(Tier::Authenticated) && session.is_none() {
            return Verdict::Deny(Denial::AuthenticationRequired);
        }

        // role checks need an identity; without one they are skipped
        let Some(session) = session else {
            return Verdict::Allow;
        };

        let mut role: Option<Option<Role>> = None;

        if classification.requires(Tier::Admin) {
            let resolved = self.lookup_role(&session.user_id).await;
            if !resolved.as_ref().is_some_and(Role::is_admin) {
                return Verdict::Deny(Denial::AdminRequired);
            }
            role = Some(resolved);
        }

        if self.is_mutating(method) && classification.requires(Tier::TeacherOrAdmin) {
            let resolved = match role {
                Some(resolved) => resolved,
                None => self.lookup_role(&session.user_id).await,
            };
            if !resolved.as_ref().is_some_and(Role::is_teacher_or_admin) {
                return Verdict::Deny(Denial::TeacherOrAdminRequired);
            }
        }

        Verdict::Allow
    }

    fn is_mutating(&self, method: &Method) -> bool {
        self.settings.mutating_methods.contains(method)
    }

    async fn resolve_session(&self, cookies: &RequestCookies) -> SessionResolution {
        match timeout(
            self.settings.collaborator_timeout,
            self.sessions.resolve(cookies),
        )
        .await
        {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(_)) | Err(_) => SessionResolution::anonymous(),
        }
    }

    async fn lookup_role(&self, user_id: &str) -> Option<Role> {
        match timeout(
            self.settings.collaborator_timeout,
            self.directory.lookup_role(user_id),
        )
        .await
        {
            Ok(Ok(role)) => role,
            Ok(Err(_)) | Err(_) => None,
        }
    }
}
