//! Access-control engine for CareBridge
//!
//! Sits between the HTTP layer and the database: workspace delegation
//! resolution with a bounded-TTL cache, client access code issuance and
//! validation, the append-only admin activity log, team membership
//! lifecycle and privileged admin operations.
//!
//! Every entry point takes an explicit [`Principal`]; there is no ambient
//! "current user" state.

pub mod admin;
pub mod audit;
pub mod error;
pub mod notes;
pub mod principal;
pub mod team;
pub mod tokens;
pub mod workspace;

pub use admin::AdminOps;
pub use audit::{ActivityFilter, ActivityLog, ActivityPage, ActivityStats};
pub use error::{AccessError, AccessResult};
pub use notes::NoteService;
pub use principal::{principal_for, role_from_db, role_to_db};
pub use team::MembershipService;
pub use tokens::{AccessCodeService, CODE_ALPHABET, CODE_LENGTH};
pub use workspace::{WorkspaceContext, WorkspaceResolver, DEFAULT_CACHE_TTL};

pub use carebridge_auth::{Capability, PermissionSet, Principal, Role};
