//! # Scanlearn Config
//!
//! Configuration types for the Scanlearn API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`jwt`]: Session token signing, lifetimes and cookie naming
//! - [`gate`]: Access gate behaviour (mutating methods, collaborator timeout, policy file)
//!
//! # Example
//!
//! ```ignore
//! use scanlearn_config::{GateConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let gate_config = GateConfig::from_env();
//! ```

pub mod gate;
pub mod jwt;

// Re-export commonly used types at crate root
pub use gate::GateConfig;
pub use jwt::JwtConfig;
