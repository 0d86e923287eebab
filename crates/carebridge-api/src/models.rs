use chrono::{DateTime, Utc};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use carebridge_auth::{PermissionSet, Role};
use carebridge_db::entities::admin_activity_log;
use carebridge_db::entities::client_access_token::{self, AccessLevel};
use carebridge_db::entities::team_member::{self, MembershipRole, MembershipStatus};
use carebridge_db::entities::{note, user};

/// Error response returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Global role as exposed over the API
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Viewer,
    Caregiver,
    Admin,
    SuperAdmin,
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Viewer => UserRole::Viewer,
            Role::Caregiver => UserRole::Caregiver,
            Role::Admin => UserRole::Admin,
            Role::SuperAdmin => UserRole::SuperAdmin,
        }
    }
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Viewer => Role::Viewer,
            UserRole::Caregiver => Role::Caregiver,
            UserRole::Admin => Role::Admin,
            UserRole::SuperAdmin => Role::SuperAdmin,
        }
    }
}

/// User account as exposed over the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            role: carebridge_access::role_from_db(&model.role).into(),
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with a session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Signed session JWT
    pub token: String,
    pub user: User,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// The caller's effective capabilities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionsResponse {
    pub role: UserRole,
    pub can_view_records: bool,
    pub can_edit_records: bool,
    pub can_view_expenses: bool,
    pub can_manage_team: bool,
    pub can_edit_settings: bool,
    pub can_view_audit_logs: bool,
    pub can_manage_users: bool,
}

impl PermissionsResponse {
    pub fn for_role(role: Role) -> Self {
        let set = PermissionSet::resolve(role);
        Self {
            role: role.into(),
            can_view_records: set.can_view_records,
            can_edit_records: set.can_edit_records,
            can_view_expenses: set.can_view_expenses,
            can_manage_team: set.can_manage_team,
            can_edit_settings: set.can_edit_settings,
            can_view_audit_logs: set.can_view_audit_logs,
            can_manage_users: set.can_manage_users,
        }
    }
}

/// Role within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Owner,
    Admin,
    Caregiver,
    Viewer,
}

impl From<MembershipRole> for TeamRole {
    fn from(role: MembershipRole) -> Self {
        match role {
            MembershipRole::Owner => TeamRole::Owner,
            MembershipRole::Admin => TeamRole::Admin,
            MembershipRole::Caregiver => TeamRole::Caregiver,
            MembershipRole::Viewer => TeamRole::Viewer,
        }
    }
}

impl From<TeamRole> for MembershipRole {
    fn from(role: TeamRole) -> Self {
        match role {
            TeamRole::Owner => MembershipRole::Owner,
            TeamRole::Admin => MembershipRole::Admin,
            TeamRole::Caregiver => MembershipRole::Caregiver,
            TeamRole::Viewer => MembershipRole::Viewer,
        }
    }
}

/// Membership lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TeamMemberStatus {
    Pending,
    Accepted,
    Removed,
}

impl From<MembershipStatus> for TeamMemberStatus {
    fn from(status: MembershipStatus) -> Self {
        match status {
            MembershipStatus::Pending => TeamMemberStatus::Pending,
            MembershipStatus::Accepted => TeamMemberStatus::Accepted,
            MembershipStatus::Removed => TeamMemberStatus::Removed,
        }
    }
}

/// The workspace the caller's writes are attributed to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceResponse {
    /// Owner id all workspace data is filed under
    pub attribution_id: Uuid,
    /// True when the caller works inside someone else's workspace
    pub is_team_member: bool,
    pub workspace_role: TeamRole,
    /// Care recipients the caller is restricted to; absent means all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_recipient_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_display_name: Option<String>,
}

impl From<carebridge_access::WorkspaceContext> for WorkspaceResponse {
    fn from(ctx: carebridge_access::WorkspaceContext) -> Self {
        Self {
            attribution_id: ctx.attribution_id,
            is_team_member: ctx.is_team_member,
            workspace_role: ctx.workspace_role.into(),
            assigned_recipient_ids: ctx.assigned_recipient_ids,
            owner_display_name: ctx.owner_display_name,
        }
    }
}

/// Scope of a client access code
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CodeAccessLevel {
    ReadSummary,
    ReadFull,
}

impl From<AccessLevel> for CodeAccessLevel {
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::ReadSummary => CodeAccessLevel::ReadSummary,
            AccessLevel::ReadFull => CodeAccessLevel::ReadFull,
        }
    }
}

impl From<CodeAccessLevel> for AccessLevel {
    fn from(level: CodeAccessLevel) -> Self {
        match level {
            CodeAccessLevel::ReadSummary => AccessLevel::ReadSummary,
            CodeAccessLevel::ReadFull => AccessLevel::ReadFull,
        }
    }
}

/// Request to issue a client access code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssueAccessCodeRequest {
    pub recipient_id: Uuid,
    pub access_level: CodeAccessLevel,
    /// Absent means the code never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A client access code as seen by the issuing workspace
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessCode {
    pub id: Uuid,
    pub code: String,
    pub recipient_id: Uuid,
    pub access_level: CodeAccessLevel,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<client_access_token::Model> for AccessCode {
    fn from(model: client_access_token::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            recipient_id: model.recipient_id,
            access_level: model.access_level.into(),
            is_active: model.is_active,
            expires_at: model.expires_at,
            last_accessed_at: model.last_accessed_at,
            created_at: model.created_at,
        }
    }
}

/// List of access codes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessCodeList {
    pub codes: Vec<AccessCode>,
    pub total: usize,
}

/// Request from an external viewer presenting a code
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateAccessCodeRequest {
    pub code: String,
}

/// What an external viewer learns from a valid code: the recipient and
/// the scope, nothing about the issuing account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateAccessCodeResponse {
    pub recipient_id: Uuid,
    pub access_level: CodeAccessLevel,
}

/// Request to invite someone into the caller's workspace
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InviteTeamMemberRequest {
    pub email: String,
    pub role: TeamRole,
    /// Restrict the member to these care recipients; absent means all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_ids: Option<Vec<Uuid>>,
}

/// A workspace membership
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMember {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Uuid>,
    pub invited_email: String,
    pub role: TeamRole,
    pub status: TeamMemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_ids: Option<Vec<Uuid>>,
    pub invited_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
}

impl From<team_member::Model> for TeamMember {
    fn from(model: team_member::Model) -> Self {
        let recipient_ids = model
            .recipient_ids
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        Self {
            id: model.id,
            member_id: model.member_id,
            invited_email: model.invited_email,
            role: model.role.into(),
            status: model.status.into(),
            recipient_ids,
            invited_at: model.invited_at,
            accepted_at: model.accepted_at,
        }
    }
}

/// List of workspace memberships
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberList {
    pub members: Vec<TeamMember>,
    pub total: usize,
}

/// Request to create a care note
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub recipient_id: Uuid,
    pub body: String,
}

/// A care note with its attribution pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: Uuid,
    /// Workspace owner the note is filed under
    pub user_id: Uuid,
    /// Account that actually wrote the note
    pub author_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<note::Model> for Note {
    fn from(model: note::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            author_id: model.author_id,
            recipient_id: model.recipient_id,
            body: model.body,
            created_at: model.created_at,
        }
    }
}

/// List of care notes
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteList {
    pub notes: Vec<Note>,
    pub total: usize,
}

/// Query parameters for the admin activity feed
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ActivityQuery {
    /// Filter by acting admin
    pub admin_id: Option<Uuid>,
    /// Filter by action kind (snake_case string, e.g. "role_changed")
    pub action: Option<String>,
    /// Filter by target kind (e.g. "user")
    pub target_type: Option<String>,
    /// Entries at or after this time
    pub start_date: Option<DateTime<Utc>>,
    /// Entries at or before this time
    pub end_date: Option<DateTime<Utc>>,
    /// Zero-based page number
    pub page: Option<u64>,
    /// Page size, capped server-side
    pub page_size: Option<u64>,
}

/// One admin activity entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<admin_activity_log::Model> for ActivityEntry {
    fn from(model: admin_activity_log::Model) -> Self {
        Self {
            id: model.id,
            admin_id: model.admin_id,
            action: model.action.to_value(),
            target_type: model.target_type.to_value(),
            target_id: model.target_id,
            details: model.details,
            created_at: model.created_at,
        }
    }
}

/// One page of the admin activity feed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityPageResponse {
    pub entries: Vec<ActivityEntry>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Rolling activity counts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityStatsResponse {
    pub last_24h: u64,
    pub last_7d: u64,
}

/// Request to change a user's global role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

/// Request to enable or disable an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}
