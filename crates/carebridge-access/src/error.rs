//! Error taxonomy for the access-control engine

use carebridge_auth::Capability;
use sea_orm::DbErr;
use thiserror::Error;

/// Errors surfaced by the access-control services.
///
/// Permission and role resolution themselves never fail; these variants
/// cover the service operations around them. Code collisions during
/// issuance are retried internally and only become `Conflict` after the
/// retry budget is exhausted.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No authenticated principal on the request
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The principal lacks a required capability; never silently downgraded
    /// to a partial result
    #[error("Permission denied: requires {0:?}")]
    PermissionDenied(Capability),

    /// Token code or record absent; deliberately carries no detail so a
    /// near-miss is indistinguishable from a total miss
    #[error("Not found")]
    NotFound,

    /// Access code past its expiry
    #[error("Access code expired")]
    Expired,

    /// Input rejected, e.g. issuing a token for a recipient outside the
    /// caller's workspace
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness conflict, e.g. a code collision that survived the
    /// internal retry budget or accepting a second workspace membership
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying storage failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type AccessResult<T> = Result<T, AccessError>;
