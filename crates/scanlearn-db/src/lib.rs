//! # Scanlearn DB
//!
//! Database pool and the Postgres-backed user directory for the Scanlearn API.
//!
//! # Example
//!
//! ```ignore
//! use scanlearn_db::{PgUserDirectory, init_db_pool};
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = init_db_pool(&std::env::var("DATABASE_URL").unwrap()).await?;
//!     let directory = PgUserDirectory::new(pool);
//! }
//! ```

use async_trait::async_trait;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use scanlearn_auth::{DirectoryError, Role, UserDirectory};

/// Initializes a PostgreSQL connection pool.
///
/// The pool connects lazily, so startup does not block on the database; the
/// first role lookup opens the first connection.
///
/// # Errors
///
/// Returns an error if `database_url` cannot be parsed.
pub fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect_lazy(database_url)
}

/// [`UserDirectory`] reading roles from the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    #[instrument(skip(self), fields(db.operation = "SELECT"))]
    async fn lookup_role(&self, user_id: &str) -> Result<Option<Role>, DirectoryError> {
        let Ok(id) = Uuid::parse_str(user_id) else {
            debug!("user id is not a UUID; no record");
            return Ok(None);
        };

        let role: Option<String> =
            sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    error!(error = %e, "role lookup failed");
                    DirectoryError::Backend(e.to_string())
                })?;

        Ok(role.map(|r| Role::parse(&r)))
    }
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;
