//! Privileged admin operations
//!
//! Role changes and account disablement, gated on super-admin capability
//! and recorded in the activity log. The audit append is best-effort: the
//! operation's success never depends on the log accepting the write.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::info;
use uuid::Uuid;

use carebridge_auth::{Capability, PermissionSet, Principal, Role};
use carebridge_db::entities::admin_activity_log::{AdminAction, AdminTargetType};
use carebridge_db::entities::user;

use crate::audit::ActivityLog;
use crate::error::{AccessError, AccessResult};
use crate::principal::{role_from_db, role_to_db};

#[derive(Clone)]
pub struct AdminOps {
    db: DatabaseConnection,
    activity: ActivityLog,
}

impl AdminOps {
    pub fn new(db: DatabaseConnection, activity: ActivityLog) -> Self {
        Self { db, activity }
    }

    fn require_user_management(principal: &Principal) -> AccessResult<()> {
        if !PermissionSet::resolve(principal.role).allows(Capability::ManageUsers) {
            return Err(AccessError::PermissionDenied(Capability::ManageUsers));
        }
        Ok(())
    }

    /// Change a user's global role.
    pub async fn change_role(
        &self,
        actor: &Principal,
        target_id: Uuid,
        new_role: Role,
    ) -> AccessResult<user::Model> {
        Self::require_user_management(actor)?;

        let target = user::Entity::find_by_id(target_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotFound)?;

        let old_role = role_from_db(&target.role);

        let mut active: user::ActiveModel = target.into();
        active.role = Set(role_to_db(new_role));
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await?;

        info!(
            actor = %actor.id,
            target = %target_id,
            from = %old_role,
            to = %new_role,
            "Changed user role"
        );

        self.activity
            .record(
                actor.id,
                AdminAction::RoleChanged,
                AdminTargetType::User,
                Some(target_id),
                serde_json::json!({ "from": old_role, "to": new_role }),
            )
            .await;

        Ok(updated)
    }

    /// Enable or disable an account.
    pub async fn set_active(
        &self,
        actor: &Principal,
        target_id: Uuid,
        active: bool,
    ) -> AccessResult<user::Model> {
        Self::require_user_management(actor)?;

        let target = user::Entity::find_by_id(target_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotFound)?;

        let mut model: user::ActiveModel = target.into();
        model.is_active = Set(active);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&self.db).await?;

        info!(actor = %actor.id, target = %target_id, active, "Set account active flag");

        let action = if active {
            AdminAction::UserEnabled
        } else {
            AdminAction::UserDisabled
        };

        self.activity
            .record(
                actor.id,
                action,
                AdminTargetType::User,
                Some(target_id),
                serde_json::json!({ "active": active }),
            )
            .await;

        Ok(updated)
    }
}
