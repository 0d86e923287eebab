//! Team membership lifecycle
//!
//! Owners and workspace admins invite helpers by email; the invited
//! identity links and accepts on first authentication. Removal is a soft
//! terminal state so records written during the membership keep their
//! attribution context.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use carebridge_auth::{Capability, PermissionSet, Principal};
use carebridge_db::entities::admin_activity_log::{AdminAction, AdminTargetType};
use carebridge_db::entities::team_member::{self, MembershipRole, MembershipStatus};
use carebridge_db::entities::prelude::*;

use crate::audit::ActivityLog;
use crate::error::{AccessError, AccessResult};
use crate::workspace::{WorkspaceContext, WorkspaceResolver};

#[derive(Clone)]
pub struct MembershipService {
    db: DatabaseConnection,
    resolver: WorkspaceResolver,
    activity: ActivityLog,
}

impl MembershipService {
    pub fn new(db: DatabaseConnection, resolver: WorkspaceResolver, activity: ActivityLog) -> Self {
        Self {
            db,
            resolver,
            activity,
        }
    }

    fn require_team_management(
        principal: &Principal,
        ctx: &WorkspaceContext,
    ) -> AccessResult<()> {
        if !PermissionSet::resolve(principal.role).allows(Capability::ManageTeam) {
            return Err(AccessError::PermissionDenied(Capability::ManageTeam));
        }
        // Delegated members additionally need admin standing within the
        // workspace they are managing.
        if ctx.is_team_member
            && !matches!(
                ctx.workspace_role,
                MembershipRole::Owner | MembershipRole::Admin
            )
        {
            return Err(AccessError::PermissionDenied(Capability::ManageTeam));
        }
        Ok(())
    }

    /// Invite a helper into the caller's workspace.
    pub async fn invite(
        &self,
        principal: &Principal,
        ctx: &WorkspaceContext,
        email: &str,
        role: MembershipRole,
        recipient_subset: Option<Vec<Uuid>>,
    ) -> AccessResult<team_member::Model> {
        Self::require_team_management(principal, ctx)?;

        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AccessError::Validation(
                "Invited email is not a valid address".to_string(),
            ));
        }

        let existing = TeamMember::find()
            .filter(team_member::Column::OwnerId.eq(ctx.attribution_id))
            .filter(team_member::Column::InvitedEmail.eq(email.clone()))
            .filter(
                Condition::any()
                    .add(team_member::Column::Status.eq(MembershipStatus::Pending))
                    .add(team_member::Column::Status.eq(MembershipStatus::Accepted)),
            )
            .one(&self.db)
            .await?;

        if existing.is_some() {
            return Err(AccessError::Validation(format!(
                "{email} already has an invite or membership in this workspace"
            )));
        }

        let membership = team_member::ActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(ctx.attribution_id),
            member_id: Set(None),
            invited_email: Set(email.clone()),
            role: Set(role),
            status: Set(MembershipStatus::Pending),
            recipient_ids: Set(recipient_subset.map(|ids| serde_json::json!(ids))),
            invited_at: Set(Utc::now()),
            accepted_at: Set(None),
            removed_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        info!(
            membership_id = %membership.id,
            workspace = %ctx.attribution_id,
            %email,
            "Invited team member"
        );

        self.activity
            .record(
                principal.id,
                AdminAction::TeamMemberAdded,
                AdminTargetType::Team,
                Some(membership.id),
                serde_json::json!({ "email": email, "role": membership.role }),
            )
            .await;

        Ok(membership)
    }

    /// Link the authenticated principal to a pending invite.
    ///
    /// Only the identity the invite was addressed to may accept it, and a
    /// principal holds at most one accepted membership.
    pub async fn accept(
        &self,
        invite_id: Uuid,
        principal: &Principal,
    ) -> AccessResult<team_member::Model> {
        let membership = TeamMember::find_by_id(invite_id)
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotFound)?;

        match membership.status {
            MembershipStatus::Pending => {}
            MembershipStatus::Accepted => {
                return Err(AccessError::Validation(
                    "Invite was already accepted".to_string(),
                ));
            }
            MembershipStatus::Removed => {
                return Err(AccessError::Validation(
                    "Membership has been removed".to_string(),
                ));
            }
        }

        // An invite addressed to someone else looks absent to this caller,
        // so nothing leaks about who was invited.
        if !membership
            .invited_email
            .eq_ignore_ascii_case(principal.email.trim())
        {
            return Err(AccessError::NotFound);
        }

        // A principal delegates to at most one workspace at a time;
        // two accepted memberships would make attribution ambiguous.
        let already_delegated = TeamMember::find()
            .filter(team_member::Column::MemberId.eq(Some(principal.id)))
            .filter(team_member::Column::Status.eq(MembershipStatus::Accepted))
            .one(&self.db)
            .await?;
        if already_delegated.is_some() {
            return Err(AccessError::Conflict(
                "Account already belongs to another workspace team".to_string(),
            ));
        }

        let mut active: team_member::ActiveModel = membership.into();
        active.member_id = Set(Some(principal.id));
        active.status = Set(MembershipStatus::Accepted);
        active.accepted_at = Set(Some(Utc::now()));
        let membership = active.update(&self.db).await?;

        // The member's next resolution must see the new delegation.
        self.resolver.invalidate(principal.id);

        info!(
            membership_id = %membership.id,
            member_id = %principal.id,
            owner_id = %membership.owner_id,
            "Accepted team invite"
        );

        Ok(membership)
    }

    /// Soft-remove a member from the caller's workspace. Idempotent.
    pub async fn remove(
        &self,
        principal: &Principal,
        ctx: &WorkspaceContext,
        membership_id: Uuid,
    ) -> AccessResult<()> {
        Self::require_team_management(principal, ctx)?;

        let membership = TeamMember::find_by_id(membership_id)
            .filter(team_member::Column::OwnerId.eq(ctx.attribution_id))
            .one(&self.db)
            .await?
            .ok_or(AccessError::NotFound)?;

        if membership.status == MembershipStatus::Removed {
            return Ok(());
        }

        let member_id = membership.member_id;
        let invited_email = membership.invited_email.clone();

        let mut active: team_member::ActiveModel = membership.into();
        active.status = Set(MembershipStatus::Removed);
        active.removed_at = Set(Some(Utc::now()));
        active.update(&self.db).await?;

        if let Some(member_id) = member_id {
            self.resolver.invalidate(member_id);
        }

        info!(%membership_id, workspace = %ctx.attribution_id, "Removed team member");

        self.activity
            .record(
                principal.id,
                AdminAction::TeamMemberRemoved,
                AdminTargetType::Team,
                Some(membership_id),
                serde_json::json!({ "email": invited_email }),
            )
            .await;

        Ok(())
    }

    /// Current (non-removed) memberships of the caller's workspace.
    pub async fn list(&self, ctx: &WorkspaceContext) -> AccessResult<Vec<team_member::Model>> {
        let memberships = TeamMember::find()
            .filter(team_member::Column::OwnerId.eq(ctx.attribution_id))
            .filter(team_member::Column::Status.ne(MembershipStatus::Removed))
            .order_by_desc(team_member::Column::InvitedAt)
            .all(&self.db)
            .await?;

        Ok(memberships)
    }
}
