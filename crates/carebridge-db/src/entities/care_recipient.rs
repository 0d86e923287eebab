//! Care recipient entity
//!
//! The person being cared for. Domain details (appointments, medications)
//! live outside this core; the row exists so workspace scoping and client
//! access tokens have something to point at.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "care_recipients")]
pub struct Model {
    /// Care recipient UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Attribution id: the workspace owner this recipient is filed under
    pub user_id: Uuid,

    /// Recipient's full name
    pub full_name: String,

    /// When the recipient was created
    pub created_at: ChronoDateTimeUtc,

    /// When the recipient was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Recipient is filed under a workspace owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Owner,

    /// Client access tokens scoped to this recipient
    #[sea_orm(has_many = "super::client_access_token::Entity")]
    ClientAccessTokens,

    /// Notes about this recipient
    #[sea_orm(has_many = "super::note::Entity")]
    Notes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::client_access_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientAccessTokens.def()
    }
}

impl Related<super::note::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
