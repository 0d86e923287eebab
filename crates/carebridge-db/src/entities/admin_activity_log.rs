//! Admin activity log entity
//!
//! Append-only. No update or delete path exists anywhere in the codebase;
//! entries are written by privileged mutation handlers and read by
//! admin-level callers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Closed taxonomy of privileged actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(64))")]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    #[sea_orm(string_value = "role_changed")]
    RoleChanged,
    #[sea_orm(string_value = "user_disabled")]
    UserDisabled,
    #[sea_orm(string_value = "user_enabled")]
    UserEnabled,
    #[sea_orm(string_value = "user_deleted")]
    UserDeleted,
    #[sea_orm(string_value = "subscription_modified")]
    SubscriptionModified,
    #[sea_orm(string_value = "subscription_canceled")]
    SubscriptionCanceled,
    #[sea_orm(string_value = "setting_updated")]
    SettingUpdated,
    #[sea_orm(string_value = "feature_flag_toggled")]
    FeatureFlagToggled,
    #[sea_orm(string_value = "data_exported")]
    DataExported,
    #[sea_orm(string_value = "team_member_added")]
    TeamMemberAdded,
    #[sea_orm(string_value = "team_member_removed")]
    TeamMemberRemoved,
    #[sea_orm(string_value = "care_recipient_created")]
    CareRecipientCreated,
    #[sea_orm(string_value = "care_recipient_updated")]
    CareRecipientUpdated,
    #[sea_orm(string_value = "care_recipient_deleted")]
    CareRecipientDeleted,
    #[sea_orm(string_value = "user_impersonated")]
    UserImpersonated,
}

/// What kind of object a privileged action touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum AdminTargetType {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "subscription")]
    Subscription,
    #[sea_orm(string_value = "setting")]
    Setting,
    #[sea_orm(string_value = "team")]
    Team,
    #[sea_orm(string_value = "care_recipient")]
    CareRecipient,
    #[sea_orm(string_value = "feature_flag")]
    FeatureFlag,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_activity_logs")]
pub struct Model {
    /// Entry UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Acting admin
    pub admin_id: Uuid,

    /// What was done
    pub action: AdminAction,

    /// What kind of object was touched
    pub target_type: AdminTargetType,

    /// The touched object, when one exists
    pub target_id: Option<Uuid>,

    /// Free-form structured detail payload
    #[sea_orm(column_type = "Json")]
    pub details: Json,

    /// When the action happened
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Entry was written by an admin user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AdminId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Admin,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
