//! Client access token entity
//!
//! A short opaque code granting scoped, time-bounded, unauthenticated-style
//! read access to exactly one care recipient. The code is the entire
//! authentication factor for the external viewer.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Read-only access tiers for external viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Condensed daily summary only
    #[sea_orm(string_value = "read_summary")]
    ReadSummary,

    /// Full read access to the recipient's records
    #[sea_orm(string_value = "read_full")]
    ReadFull,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "client_access_tokens")]
pub struct Model {
    /// Token UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// 8-character code over the unambiguous alphabet
    #[sea_orm(unique)]
    pub code: String,

    /// Owning workspace (attribution id of the issuer's workspace)
    pub user_id: Uuid,

    /// The single care recipient this token is scoped to
    pub recipient_id: Uuid,

    /// Access tier granted to the external viewer
    pub access_level: AccessLevel,

    /// False once revoked; a revoked code is never reused
    pub is_active: bool,

    /// When the token expires (NULL = never)
    pub expires_at: Option<ChronoDateTimeUtc>,

    /// Updated on every successful validation
    pub last_accessed_at: Option<ChronoDateTimeUtc>,

    /// When the token was issued
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Token belongs to a workspace owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,

    /// Token is scoped to a care recipient
    #[sea_orm(
        belongs_to = "super::care_recipient::Entity",
        from = "Column::RecipientId",
        to = "super::care_recipient::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Recipient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::care_recipient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
