//! Authorization primitives for the CareBridge care-coordination platform
//!
//! Pure role and permission resolution, session JWT handling and password
//! hashing. Nothing in this crate touches the database; callers pass
//! principal context in explicitly.

pub mod jwt;
pub mod password;
pub mod permissions;
pub mod role;

pub use jwt::{JwtError, JwtValidator, SessionClaims};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{Capability, PermissionSet};
pub use role::{Principal, Role};
