//! User directory seam.
//!
//! The gate only needs one fact about a user: their role. [`UserDirectory`]
//! exposes that lookup; [`InMemoryUserDirectory`] is a map-backed implementation
//! for tests and local development.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Role stored on a user record.
///
/// Matching is exact and case-sensitive: `"Admin"` is [`Role::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Other(raw) => raw,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_teacher_or_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("user directory backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when the user has no record.
    async fn lookup_role(&self, user_id: &str) -> Result<Option<Role>, DirectoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, Role>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users<I, K>(users: I) -> Self
    where
        I: IntoIterator<Item = (K, Role)>,
        K: Into<String>,
    {
        Self {
            users: RwLock::new(users.into_iter().map(|(k, r)| (k.into(), r)).collect()),
        }
    }

    pub async fn insert(&self, user_id: impl Into<String>, role: Role) {
        self.users.write().await.insert(user_id.into(), role);
    }

    pub async fn remove(&self, user_id: &str) -> Option<Role> {
        self.users.write().await.remove(user_id)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup_role(&self, user_id: &str) -> Result<Option<Role>, DirectoryError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("teacher"), Role::Teacher);
        assert_eq!(Role::parse("student"), Role::Student);
        assert_eq!(Role::parse("Admin"), Role::Other("Admin".to_string()));
        assert_eq!(Role::parse("parent").as_str(), "parent");
    }

    #[test]
    fn test_role_privileges() {
        assert!(Role::Admin.is_admin());
        assert!(!Role::Teacher.is_admin());

        assert!(Role::Admin.is_teacher_or_admin());
        assert!(Role::Teacher.is_teacher_or_admin());
        assert!(!Role::Student.is_teacher_or_admin());
        assert!(!Role::Other("janitor".to_string()).is_teacher_or_admin());
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let directory = InMemoryUserDirectory::with_users([("u1", Role::Teacher)]);

        assert_eq!(directory.lookup_role("u1").await.unwrap(), Some(Role::Teacher));
        assert_eq!(directory.lookup_role("missing").await.unwrap(), None);

        directory.insert("u2", Role::Admin).await;
        assert_eq!(directory.lookup_role("u2").await.unwrap(), Some(Role::Admin));

        assert_eq!(directory.remove("u1").await, Some(Role::Teacher));
        assert_eq!(directory.lookup_role("u1").await.unwrap(), None);
    }
}
