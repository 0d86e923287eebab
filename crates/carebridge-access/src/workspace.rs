//! Workspace delegation resolver
//!
//! Decides, for an authenticated principal, whose workspace their writes
//! belong to. An accepted team membership delegates attribution to the
//! membership's owner; otherwise the principal is their own workspace
//! owner. Stamping the acting principal's id into `user_id` for a
//! delegated member is the single most damaging bug this layer exists to
//! prevent: it silently fragments a shared workspace across owner ids.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use carebridge_db::entities::team_member::{self, MembershipRole, MembershipStatus};
use carebridge_db::entities::user;

use crate::error::AccessResult;

/// Default staleness window for cached resolutions.
///
/// Membership changes are rare; a stale read only risks a brief window in
/// which a just-revoked member can still attribute writes to the old
/// owner, and the owner can audit and reverse those writes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Result of delegation resolution for one principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceContext {
    /// Id under which the principal's writes are filed (the workspace
    /// owner's id)
    pub attribution_id: Uuid,

    /// True when the principal acts inside someone else's workspace
    pub is_team_member: bool,

    /// The principal's standing within that workspace
    pub workspace_role: MembershipRole,

    /// Care recipients the principal is restricted to; `None` = all
    pub assigned_recipient_ids: Option<Vec<Uuid>>,

    /// Display name of the workspace owner, for UI attribution
    pub owner_display_name: Option<String>,
}

impl WorkspaceContext {
    /// Whether the principal may touch the given care recipient.
    pub fn can_access_recipient(&self, recipient_id: Uuid) -> bool {
        match &self.assigned_recipient_ids {
            None => true,
            Some(ids) => ids.contains(&recipient_id),
        }
    }

    fn self_owned(principal_id: Uuid, display_name: Option<String>) -> Self {
        Self {
            attribution_id: principal_id,
            is_team_member: false,
            workspace_role: MembershipRole::Owner,
            assigned_recipient_ids: None,
            owner_display_name: display_name,
        }
    }
}

struct CacheEntry {
    context: WorkspaceContext,
    cached_at: Instant,
}

/// Read-through resolver with a bounded-TTL cache keyed by principal id.
///
/// There is no write-invalidation guarantee: a membership change takes
/// effect for a principal once their entry expires or is explicitly
/// invalidated by the membership service. The window is bounded by the
/// configured TTL and must stay in the order of minutes.
#[derive(Clone)]
pub struct WorkspaceResolver {
    db: DatabaseConnection,
    ttl: Duration,
    cache: Arc<RwLock<HashMap<Uuid, CacheEntry>>>,
}

impl WorkspaceResolver {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_ttl(db, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(db: DatabaseConnection, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve the workspace a principal's writes belong to.
    pub async fn resolve(&self, principal_id: Uuid) -> AccessResult<WorkspaceContext> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(entry) = cache.get(&principal_id) {
                if entry.cached_at.elapsed() < self.ttl {
                    return Ok(entry.context.clone());
                }
            }
        }

        let context = self.lookup(principal_id).await?;

        let mut cache = self.cache.write().unwrap();
        cache.insert(
            principal_id,
            CacheEntry {
                context: context.clone(),
                cached_at: Instant::now(),
            },
        );

        Ok(context)
    }

    /// Drop the cached resolution for one principal.
    ///
    /// Called best-effort by membership mutations so accept/remove take
    /// effect without waiting out the TTL.
    pub fn invalidate(&self, principal_id: Uuid) {
        let mut cache = self.cache.write().unwrap();
        if cache.remove(&principal_id).is_some() {
            debug!(%principal_id, "Invalidated workspace cache entry");
        }
    }

    async fn lookup(&self, principal_id: Uuid) -> AccessResult<WorkspaceContext> {
        // The membership service rejects a second accepted membership, so
        // at most one row matches; the ordering keeps resolution stable
        // should legacy data ever violate that.
        let membership = team_member::Entity::find()
            .filter(team_member::Column::MemberId.eq(Some(principal_id)))
            .filter(team_member::Column::Status.eq(MembershipStatus::Accepted))
            .order_by_asc(team_member::Column::AcceptedAt)
            .one(&self.db)
            .await?;

        let Some(membership) = membership else {
            // No accepted membership: the principal owns their own workspace.
            let display_name = user::Entity::find_by_id(principal_id)
                .one(&self.db)
                .await?
                .and_then(|u| u.display_name);
            return Ok(WorkspaceContext::self_owned(principal_id, display_name));
        };

        let owner_display_name = user::Entity::find_by_id(membership.owner_id)
            .one(&self.db)
            .await?
            .and_then(|u| u.display_name);

        let assigned_recipient_ids = membership.recipient_ids.as_ref().map(|value| {
            serde_json::from_value::<Vec<Uuid>>(value.clone()).unwrap_or_else(|e| {
                // A malformed subset must not widen access; treat it as
                // "no recipients" rather than "all recipients".
                warn!(
                    membership_id = %membership.id,
                    error = %e,
                    "Malformed recipient subset, restricting to empty set"
                );
                Vec::new()
            })
        });

        debug!(
            %principal_id,
            owner_id = %membership.owner_id,
            role = ?membership.role,
            "Resolved delegated workspace"
        );

        Ok(WorkspaceContext {
            attribution_id: membership.owner_id,
            is_team_member: true,
            workspace_role: membership.role,
            assigned_recipient_ids,
            owner_display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_context_allows_any_recipient() {
        let ctx = WorkspaceContext::self_owned(Uuid::new_v4(), None);
        assert!(ctx.can_access_recipient(Uuid::new_v4()));
    }

    #[test]
    fn test_subset_context_restricts_recipients() {
        let allowed = Uuid::new_v4();
        let ctx = WorkspaceContext {
            attribution_id: Uuid::new_v4(),
            is_team_member: true,
            workspace_role: MembershipRole::Caregiver,
            assigned_recipient_ids: Some(vec![allowed]),
            owner_display_name: None,
        };

        assert!(ctx.can_access_recipient(allowed));
        assert!(!ctx.can_access_recipient(Uuid::new_v4()));
    }

    #[test]
    fn test_empty_subset_denies_everything() {
        let ctx = WorkspaceContext {
            attribution_id: Uuid::new_v4(),
            is_team_member: true,
            workspace_role: MembershipRole::Viewer,
            assigned_recipient_ids: Some(Vec::new()),
            owner_display_name: None,
        };

        assert!(!ctx.can_access_recipient(Uuid::new_v4()));
    }
}
