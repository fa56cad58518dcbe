//! Route policy table.
//!
//! A [`PolicyTable`] is an ordered list of [`PolicyRule`]s, each binding a path
//! prefix (optionally restricted to one HTTP method) to the [`Tier`] a caller must
//! reach. Rules are not first-match-wins: every rule matching a request applies,
//! so overlapping prefixes combine their requirements.
//!
//! # Prefix Syntax
//!
//! - A trailing `*` is ignored: `/api/textbooks/*` behaves like `/api/textbooks/`
//! - An embedded `*` matches exactly one non-empty path segment:
//!   `/api/quizzes/*/submit` matches `/api/quizzes/42/submit`
//! - Everything else is a plain string prefix, so `/api/scans` also covers
//!   `/api/scans/7` and `/api/scans-archive`
//!
//! # Policy Files
//!
//! ```json
//! [
//!   { "path_prefix": "/api/scans", "tier": "AUTHENTICATED" },
//!   { "path_prefix": "/api/quizzes", "tier": "TEACHER_OR_ADMIN", "method": "POST" }
//! ]
//! ```

use std::path::Path;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Minimum privilege a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Public,
    Authenticated,
    TeacherOrAdmin,
    Admin,
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("path prefix must start with '/': {0:?}")]
    InvalidPrefix(String),

    #[error("invalid HTTP method {method:?} for prefix {prefix:?}")]
    InvalidMethod { prefix: String, method: String },

    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A path prefix split on its embedded wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPattern {
    source: String,
    pieces: Vec<String>,
}

impl PathPattern {
    fn parse(prefix: &str) -> Result<Self, PolicyError> {
        if !prefix.starts_with('/') {
            return Err(PolicyError::InvalidPrefix(prefix.to_string()));
        }

        Ok(Self::split(prefix))
    }

    fn split(prefix: &str) -> Self {
        let source = prefix.strip_suffix('*').unwrap_or(prefix).to_string();
        let pieces = source.split('*').map(str::to_string).collect();

        Self { source, pieces }
    }

    fn matches(&self, path: &str) -> bool {
        let mut pieces = self.pieces.iter();
        let Some(first) = pieces.next() else {
            return true;
        };
        let Some(mut rest) = path.strip_prefix(first.as_str()) else {
            return false;
        };

        for piece in pieces {
            let segment_end = rest.find('/').unwrap_or(rest.len());
            if segment_end == 0 {
                return false;
            }
            match rest[segment_end..].strip_prefix(piece.as_str()) {
                Some(remaining) => rest = remaining,
                None => return false,
            }
        }

        true
    }

    fn specificity(&self) -> usize {
        self.source.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pattern: PathPattern,
    method: Option<Method>,
    tier: Tier,
}

impl PolicyRule {
    pub fn new(path_prefix: &str, tier: Tier) -> Result<Self, PolicyError> {
        Ok(Self {
            pattern: PathPattern::parse(path_prefix)?,
            method: None,
            tier,
        })
    }

    /// Restricts the rule to requests using `method`.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path_prefix(&self) -> &str {
        &self.pattern.source
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn matches(&self, path: &str, method: &Method) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

/// On-disk representation of a rule.
#[derive(Debug, Clone, Deserialize)]
struct RuleEntry {
    path_prefix: String,
    #[serde(default)]
    method: Option<String>,
    tier: Tier,
}

impl TryFrom<RuleEntry> for PolicyRule {
    type Error = PolicyError;

    fn try_from(entry: RuleEntry) -> Result<Self, Self::Error> {
        let rule = PolicyRule::new(&entry.path_prefix, entry.tier)?;

        match entry.method {
            Some(raw) => {
                let method = Method::from_bytes(raw.trim().to_uppercase().as_bytes()).map_err(
                    |_| PolicyError::InvalidMethod {
                        prefix: entry.path_prefix.clone(),
                        method: raw.clone(),
                    },
                )?;
                Ok(rule.with_method(method))
            }
            None => Ok(rule),
        }
    }
}

/// Rules matching one request, most specific prefix first.
#[derive(Debug, Clone)]
pub struct Classification<'a> {
    rules: Vec<&'a PolicyRule>,
}

impl<'a> Classification<'a> {
    pub fn rules(&self) -> &[&'a PolicyRule] {
        &self.rules
    }

    pub fn requires(&self, tier: Tier) -> bool {
        self.rules.iter().any(|rule| rule.tier == tier)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.rules.iter().all(|rule| rule.tier == Tier::Public)
    }
}

/// Immutable, ordered set of route rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl PolicyTable {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// The routes served by the Scanlearn API.
    pub fn builtin() -> Self {
        let rule = |prefix: &str, tier: Tier| PolicyRule {
            pattern: PathPattern::split(prefix),
            method: None,
            tier,
        };

        Self::new(vec![
            rule("/api/scans", Tier::Authenticated),
            rule("/api/progress", Tier::Authenticated),
            rule("/api/analytics", Tier::Authenticated),
            rule("/api/quizzes/*/submit", Tier::Authenticated),
            rule("/api/analytics", Tier::Admin),
            rule("/api/textbooks", Tier::Admin),
            rule("/api/textbooks", Tier::TeacherOrAdmin).with_method(Method::POST),
            rule("/api/quizzes", Tier::TeacherOrAdmin).with_method(Method::POST),
        ])
    }

    pub fn from_json_str(raw: &str) -> Result<Self, PolicyError> {
        let entries: Vec<RuleEntry> = serde_json::from_str(raw)?;
        let rules = entries
            .into_iter()
            .map(PolicyRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    /// Every rule matching `path` and `method`, longest prefix first.
    ///
    /// Rules with equally long prefixes keep their listing order.
    pub fn classify(&self, path: &str, method: &Method) -> Classification<'_> {
        let mut rules: Vec<&PolicyRule> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(path, method))
            .collect();
        rules.sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));

        Classification { rules }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}
