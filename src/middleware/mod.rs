//! Middleware for request processing.
//!
//! - [`access`]: Runs the access gate for `/api` routes and applies its cookie writes
//!
//! # Request Flow
//!
//! 1. [`access::is_gated_path`] decides whether the gate applies at all
//! 2. Request cookies are handed to [`scanlearn_auth::AccessGate::evaluate`]
//! 3. Refreshed session cookies are written to the request and the response
//! 4. Denied requests get a JSON error; allowed ones continue to the handler

pub mod access;
