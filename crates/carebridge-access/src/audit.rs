//! Admin activity audit log
//!
//! Appends are best-effort-but-loud: a failed append is logged at error
//! level and swallowed, never rolling back or blocking the privileged
//! action it records. Blocking a role change on audit-log availability
//! would lock admins out of fixing things during an incident, which is the
//! worse failure mode.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use carebridge_auth::{Capability, PermissionSet, Principal};
use carebridge_db::entities::admin_activity_log::{self, AdminAction, AdminTargetType};
use carebridge_db::entities::prelude::*;

use crate::error::{AccessError, AccessResult};

/// Max page size for audit queries.
const MAX_PAGE_SIZE: u64 = 100;

/// Filters for the audit read surface. All fields are optional and
/// combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub admin_id: Option<Uuid>,
    pub action: Option<AdminAction>,
    pub target_type: Option<AdminTargetType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// One page of audit entries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityPage {
    pub entries: Vec<admin_activity_log::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Entry counts over rolling windows.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActivityStats {
    pub last_24h: u64,
    pub last_7d: u64,
}

#[derive(Clone)]
pub struct ActivityLog {
    db: DatabaseConnection,
}

impl ActivityLog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append an entry for a privileged action.
    ///
    /// Infallible from the caller's perspective: storage failures are
    /// logged and swallowed so the triggering action still completes.
    pub async fn record(
        &self,
        actor_id: Uuid,
        action: AdminAction,
        target_type: AdminTargetType,
        target_id: Option<Uuid>,
        details: serde_json::Value,
    ) {
        let entry = admin_activity_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            admin_id: Set(actor_id),
            action: Set(action.clone()),
            target_type: Set(target_type),
            target_id: Set(target_id),
            details: Set(details),
            created_at: Set(Utc::now()),
        };

        match entry.insert(&self.db).await {
            Ok(entry) => {
                debug!(entry_id = %entry.id, action = ?action, "Appended admin activity entry")
            }
            Err(e) => {
                error!(
                    %actor_id,
                    action = ?action,
                    error = %e,
                    "Failed to append admin activity entry; the privileged action itself is unaffected"
                );
            }
        }
    }

    /// Filtered, paginated read surface, restricted to admin-level callers.
    pub async fn query(
        &self,
        principal: &Principal,
        filter: &ActivityFilter,
        page: u64,
        page_size: u64,
    ) -> AccessResult<ActivityPage> {
        if !PermissionSet::resolve(principal.role).allows(Capability::ViewAuditLogs) {
            return Err(AccessError::PermissionDenied(Capability::ViewAuditLogs));
        }

        let mut condition = Condition::all();

        if let Some(admin_id) = filter.admin_id {
            condition = condition.add(admin_activity_log::Column::AdminId.eq(admin_id));
        }
        if let Some(ref action) = filter.action {
            condition = condition.add(admin_activity_log::Column::Action.eq(action.clone()));
        }
        if let Some(ref target_type) = filter.target_type {
            condition =
                condition.add(admin_activity_log::Column::TargetType.eq(target_type.clone()));
        }
        if let Some(start) = filter.start_date {
            condition = condition.add(admin_activity_log::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.end_date {
            condition = condition.add(admin_activity_log::Column::CreatedAt.lte(end));
        }

        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let paginator = AdminActivityLog::find()
            .filter(condition)
            .order_by_desc(admin_activity_log::Column::CreatedAt)
            .paginate(&self.db, page_size);

        let total = paginator.num_items().await?;
        let entries = paginator.fetch_page(page).await?;

        Ok(ActivityPage {
            entries,
            total,
            page,
            page_size,
        })
    }

    /// Entry counts over rolling 24-hour and 7-day windows.
    pub async fn stats(&self, principal: &Principal) -> AccessResult<ActivityStats> {
        if !PermissionSet::resolve(principal.role).allows(Capability::ViewAuditLogs) {
            return Err(AccessError::PermissionDenied(Capability::ViewAuditLogs));
        }

        let now = Utc::now();

        let last_24h = AdminActivityLog::find()
            .filter(admin_activity_log::Column::CreatedAt.gte(now - Duration::hours(24)))
            .count(&self.db)
            .await?;

        let last_7d = AdminActivityLog::find()
            .filter(admin_activity_log::Column::CreatedAt.gte(now - Duration::days(7)))
            .count(&self.db)
            .await?;

        Ok(ActivityStats { last_24h, last_7d })
    }
}
