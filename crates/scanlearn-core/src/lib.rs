//! # Scanlearn Core
//!
//! Core types shared by every Scanlearn crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use scanlearn_core::AppError;
//!
//! let error = AppError::forbidden("Admin access required");
//! let response = error.into_response();
//! ```

pub mod errors;

// Re-export commonly used types at crate root
pub use errors::{AppError, ErrorBody};
