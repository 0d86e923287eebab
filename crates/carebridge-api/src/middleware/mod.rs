//! API middleware
//!
//! Authentication and request processing middleware for the API server.

pub mod auth;

pub use auth::{require_auth, AuthUser, JwtState};
