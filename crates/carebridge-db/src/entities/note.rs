//! Note entity with dual attribution
//!
//! `user_id` is the attribution id (whose workspace the row is filed under,
//! for row-scoped authorization); `author_id` is the authorship id (who
//! actually wrote it). For a workspace owner writing on their own data the
//! two are identical; for a delegated team member they differ.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    /// Note UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Attribution id: the workspace owner
    pub user_id: Uuid,

    /// Authorship id: the principal who wrote the note
    pub author_id: Uuid,

    /// Care recipient the note is about
    pub recipient_id: Uuid,

    /// Note body
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// When the note was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Note is about a care recipient
    #[sea_orm(
        belongs_to = "super::care_recipient::Entity",
        from = "Column::RecipientId",
        to = "super::care_recipient::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Recipient,
}

impl Related<super::care_recipient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
