//! Team membership entity relating a member to a workspace owner

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The member's standing within a specific workspace, independent of their
/// global role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    /// The workspace owner themselves
    #[sea_orm(string_value = "owner")]
    Owner,

    /// Delegated administrator of the workspace
    #[sea_orm(string_value = "admin")]
    Admin,

    /// Helper who edits records
    #[sea_orm(string_value = "caregiver")]
    Caregiver,

    /// Read-only participant
    #[sea_orm(string_value = "viewer")]
    Viewer,
}

/// Lifecycle of a membership. Removal is a terminal soft state so past
/// writes keep their attribution context; rows are never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Invited, not yet linked to an authenticated account
    #[sea_orm(string_value = "pending")]
    Pending,

    /// Invited identity authenticated and linked
    #[sea_orm(string_value = "accepted")]
    Accepted,

    /// Removed from the workspace; kept for attribution history
    #[sea_orm(string_value = "removed")]
    Removed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_members")]
pub struct Model {
    /// Membership UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Workspace owner this membership belongs to
    pub owner_id: Uuid,

    /// Member user id; null while the invite is still pending
    pub member_id: Option<Uuid>,

    /// Email the invite was sent to
    pub invited_email: String,

    /// Standing within the workspace
    pub role: MembershipRole,

    /// Lifecycle status
    pub status: MembershipStatus,

    /// JSON array of care-recipient uuids the member is restricted to;
    /// null means unrestricted
    #[sea_orm(column_type = "Json", nullable)]
    pub recipient_ids: Option<Json>,

    /// When the invite was created
    pub invited_at: ChronoDateTimeUtc,

    /// When the invite was accepted
    pub accepted_at: Option<ChronoDateTimeUtc>,

    /// When the membership was removed
    pub removed_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Membership belongs to a workspace owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
