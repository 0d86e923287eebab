//! Global role table and ordering

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Global role of a principal, ordered from least to most privileged.
///
/// The derived `Ord` follows declaration order, so
/// `Viewer < Caregiver < Admin < SuperAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to records
    Viewer,

    /// Can create and edit care records
    Caregiver,

    /// Can manage the workspace team and settings
    Admin,

    /// Full platform administration, including role changes
    SuperAdmin,
}

impl Role {
    /// Parse a role string, coercing anything unrecognized to `Viewer`.
    ///
    /// Permission resolution must never fail open: a missing, empty or
    /// malformed role always degrades to the least-privileged
    /// interpretation rather than erroring.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim() {
            "caregiver" => Role::Caregiver,
            "admin" => Role::Admin,
            "super_admin" => Role::SuperAdmin,
            _ => Role::Viewer,
        }
    }

    /// Numeric rank in the total order (viewer = 0 .. super_admin = 3).
    pub fn rank(self) -> u8 {
        match self {
            Role::Viewer => 0,
            Role::Caregiver => 1,
            Role::Admin => 2,
            Role::SuperAdmin => 3,
        }
    }

    /// True iff this role's rank is at least `minimum`'s rank.
    pub fn has_minimum(self, minimum: Role) -> bool {
        self.rank() >= minimum.rank()
    }

    /// Membership test against an explicit allow-list.
    ///
    /// Used where the allowed set is non-contiguous and a minimum-rank
    /// check would be wrong.
    pub fn is_allowed(self, allowed: &[Role]) -> bool {
        allowed.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Caregiver => "caregiver",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Viewer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated identity, passed explicitly into every resolver call.
///
/// There is deliberately no ambient "current user" state anywhere in the
/// codebase; handlers construct a `Principal` from the verified session and
/// hand it down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Immutable user id
    pub id: Uuid,
    /// Email the principal authenticated with
    pub email: String,
    /// Global role
    pub role: Role,
}

impl Principal {
    pub fn new(id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}
