//! Client access code service
//!
//! Issues, validates and revokes the short external access codes that grant
//! scoped read access to one care recipient without a full account.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use carebridge_auth::{Capability, PermissionSet, Principal};
use carebridge_db::entities::client_access_token::{self, AccessLevel};
use carebridge_db::entities::{care_recipient, prelude::*};

use crate::error::{AccessError, AccessResult};
use crate::workspace::WorkspaceContext;

/// 32-symbol alphabet with visually confusable characters removed
/// (no 0/O, no 1/I).
pub const CODE_ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Access codes are always exactly this long.
pub const CODE_LENGTH: usize = 8;

/// Bounded retry budget for unique-insert collisions. At the expected
/// cardinality (low thousands of live codes against 32^8 possibilities) a
/// single retry is already vanishingly rare.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Generate a fresh code from a cryptographically strong source.
///
/// The code is the entire authentication factor for the external viewer,
/// so a predictable generator here would be an authentication bypass.
fn generate_code() -> String {
    let mut rng = OsRng;
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[derive(Clone)]
pub struct AccessCodeService {
    db: DatabaseConnection,
}

impl AccessCodeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Issue a code for one care recipient in the caller's workspace.
    ///
    /// Requires record-management permission, and the recipient must be
    /// filed under the caller's attribution id and inside the caller's
    /// assigned subset.
    pub async fn issue(
        &self,
        principal: &Principal,
        ctx: &WorkspaceContext,
        recipient_id: Uuid,
        access_level: AccessLevel,
        expires_at: Option<DateTime<Utc>>,
    ) -> AccessResult<client_access_token::Model> {
        if !PermissionSet::resolve(principal.role).allows(Capability::EditRecords) {
            return Err(AccessError::PermissionDenied(Capability::EditRecords));
        }

        let recipient = CareRecipient::find_by_id(recipient_id)
            .filter(care_recipient::Column::UserId.eq(ctx.attribution_id))
            .one(&self.db)
            .await?;

        if recipient.is_none() || !ctx.can_access_recipient(recipient_id) {
            return Err(AccessError::Validation(
                "Recipient does not belong to the caller's workspace".to_string(),
            ));
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_code();
            let token = client_access_token::ActiveModel {
                id: Set(Uuid::new_v4()),
                code: Set(code),
                user_id: Set(ctx.attribution_id),
                recipient_id: Set(recipient_id),
                access_level: Set(access_level.clone()),
                is_active: Set(true),
                expires_at: Set(expires_at),
                last_accessed_at: Set(None),
                created_at: Set(Utc::now()),
            };

            match token.insert(&self.db).await {
                Ok(model) => {
                    info!(
                        token_id = %model.id,
                        workspace = %ctx.attribution_id,
                        %recipient_id,
                        "Issued client access code"
                    );
                    return Ok(model);
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    warn!(attempt, "Access code collision, regenerating");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AccessError::Conflict(
            "Could not generate a unique access code".to_string(),
        ))
    }

    /// Validate a code presented by an external viewer.
    ///
    /// Exact-match lookup against active tokens only; the error for a
    /// revoked or unknown code is identical so nothing leaks about near
    /// matches. Expiry is enforced here, lazily, and this check is
    /// authoritative regardless of any background sweeping.
    pub async fn validate(&self, code: &str) -> AccessResult<client_access_token::Model> {
        let token = ClientAccessToken::find()
            .filter(client_access_token::Column::Code.eq(code))
            .filter(client_access_token::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotFound)?;

        if let Some(expires_at) = token.expires_at {
            if expires_at < Utc::now() {
                return Err(AccessError::Expired);
            }
        }

        // Best-effort access stamp; validation already succeeded and a lost
        // update here must not fail it.
        let mut stamp: client_access_token::ActiveModel = token.clone().into();
        stamp.last_accessed_at = Set(Some(Utc::now()));
        if let Err(e) = stamp.update(&self.db).await {
            warn!(token_id = %token.id, error = %e, "Failed to record last access time");
        }

        debug!(token_id = %token.id, "Validated client access code");
        Ok(token)
    }

    /// Revoke a token in the caller's workspace. Idempotent: revoking an
    /// already-revoked token is a no-op success. A token belonging to a
    /// different workspace looks absent.
    pub async fn revoke(&self, ctx: &WorkspaceContext, token_id: Uuid) -> AccessResult<()> {
        let token = ClientAccessToken::find_by_id(token_id)
            .filter(client_access_token::Column::UserId.eq(ctx.attribution_id))
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotFound)?;

        if !token.is_active {
            return Ok(());
        }

        let mut active: client_access_token::ActiveModel = token.into();
        active.is_active = Set(false);
        active.update(&self.db).await?;

        info!(%token_id, "Revoked client access code");
        Ok(())
    }

    /// List tokens issued under the caller's workspace, newest first.
    pub async fn list_for_workspace(
        &self,
        ctx: &WorkspaceContext,
    ) -> AccessResult<Vec<client_access_token::Model>> {
        let tokens = ClientAccessToken::find()
            .filter(client_access_token::Column::UserId.eq(ctx.attribution_id))
            .order_by_desc(client_access_token::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_has_no_confusable_symbols() {
        for banned in [b'0', b'O', b'1', b'I'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
        assert_eq!(CODE_ALPHABET.len(), 32);
    }

    #[test]
    fn test_generated_code_shape() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generated_codes_are_not_constant() {
        let first = generate_code();
        // 32^8 possibilities; 20 draws colliding entirely would mean the
        // generator is broken.
        let any_different = (0..20).any(|_| generate_code() != first);
        assert!(any_different);
    }
}
