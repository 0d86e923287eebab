//! User entity for authentication and role storage

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Global role of a user, stored as a closed string enum.
///
/// The database rejects anything outside this set; string role inputs from
/// untrusted sources go through `carebridge_auth::Role::parse_lossy`
/// instead, which degrades to viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    /// Read-only access
    #[sea_orm(string_value = "viewer")]
    Viewer,

    /// Can create and edit care records
    #[sea_orm(string_value = "caregiver")]
    Caregiver,

    /// Can manage the workspace team and settings
    #[sea_orm(string_value = "admin")]
    Admin,

    /// Full platform administration
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// User email (unique)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Display name shown to other workspace members
    pub display_name: Option<String>,

    /// Global role
    pub role: GlobalRole,

    /// Whether the account is enabled
    pub is_active: bool,

    /// When the account was created
    pub created_at: ChronoDateTimeUtc,

    /// When the account was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Memberships where this user is the workspace owner
    #[sea_orm(has_many = "super::team_member::Entity")]
    OwnedMemberships,

    /// Care recipients filed under this user's workspace
    #[sea_orm(has_many = "super::care_recipient::Entity")]
    CareRecipients,

    /// Client access tokens issued under this user's workspace
    #[sea_orm(has_many = "super::client_access_token::Entity")]
    ClientAccessTokens,
}

impl Related<super::care_recipient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CareRecipients.def()
    }
}

impl Related<super::client_access_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClientAccessTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
