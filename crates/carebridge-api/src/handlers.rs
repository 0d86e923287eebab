use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Duration;
use sea_orm::{ActiveEnum, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use carebridge_access::{principal_for, AccessError, ActivityFilter, Principal};
use carebridge_auth::{hash_password, verify_password, JwtValidator, SessionClaims};
use carebridge_db::entities::admin_activity_log::{AdminAction, AdminTargetType};
use carebridge_db::entities::user::{self, GlobalRole};

use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Session lifetime for freshly issued tokens.
const SESSION_VALIDITY_HOURS: i64 = 24;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: Some(code.to_string()),
        }),
    )
}

/// Map engine errors onto the wire taxonomy.
fn map_access_error(e: AccessError) -> ApiError {
    match e {
        AccessError::AuthenticationRequired => {
            error(StatusCode::UNAUTHORIZED, e.to_string(), "UNAUTHENTICATED")
        }
        AccessError::PermissionDenied(_) => {
            error(StatusCode::FORBIDDEN, e.to_string(), "PERMISSION_DENIED")
        }
        AccessError::NotFound => error(StatusCode::NOT_FOUND, e.to_string(), "NOT_FOUND"),
        AccessError::Expired => error(StatusCode::GONE, e.to_string(), "EXPIRED"),
        AccessError::Validation(_) => {
            error(StatusCode::BAD_REQUEST, e.to_string(), "VALIDATION_ERROR")
        }
        AccessError::Conflict(_) => error(StatusCode::CONFLICT, e.to_string(), "CONFLICT"),
        AccessError::Database(e) => {
            warn!(error = %e, "Database error while handling request");
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
    }
}

fn db_error(e: sea_orm::DbErr) -> ApiError {
    map_access_error(AccessError::Database(e))
}

/// Re-read the caller's account row so privileged checks use the stored
/// role, not the role claim baked into the session at login time.
async fn load_principal(
    state: &AppState,
    auth: &AuthUser,
) -> Result<(user::Model, Principal), ApiError> {
    let account = user::Entity::find_by_id(auth.user_id)
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unknown account", "UNKNOWN_ACCOUNT"))?;

    if !account.is_active {
        return Err(error(
            StatusCode::FORBIDDEN,
            "Account is disabled",
            "ACCOUNT_DISABLED",
        ));
    }

    let principal = principal_for(&account);
    Ok((account, principal))
}

// ---------------------------------------------------------------
// System
// ---------------------------------------------------------------

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ---------------------------------------------------------------
// Auth
// ---------------------------------------------------------------

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = request.email.trim().to_lowercase();

    // Unknown email and wrong password produce the same error.
    let invalid =
        || error(StatusCode::UNAUTHORIZED, "Invalid email or password", "INVALID_CREDENTIALS");

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(invalid)?;

    let verified = verify_password(&request.password, &account.password_hash)
        .map_err(|_| invalid())?;
    if !verified {
        return Err(invalid());
    }

    if !account.is_active {
        return Err(error(
            StatusCode::FORBIDDEN,
            "Account is disabled",
            "ACCOUNT_DISABLED",
        ));
    }

    let role = carebridge_access::role_from_db(&account.role);
    let claims = SessionClaims::new(
        account.id.to_string(),
        account.email.clone(),
        role,
        Duration::hours(SESSION_VALIDITY_HOURS),
    );
    let token = JwtValidator::encode(state.jwt_secret.as_bytes(), &claims).map_err(|e| {
        warn!(error = %e, "Failed to sign session token");
        error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            "INTERNAL_ERROR",
        )
    })?;

    info!(user_id = %account.id, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user: account.into(),
    }))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Signup disabled", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if !state.allow_signup {
        return Err(error(
            StatusCode::FORBIDDEN,
            "Signup is disabled on this server",
            "SIGNUP_DISABLED",
        ));
    }

    let email = request.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "Invalid email address",
            "INVALID_EMAIL",
        ));
    }
    if request.password.len() < 8 {
        return Err(error(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters",
            "WEAK_PASSWORD",
        ));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(db_error)?;
    if existing.is_some() {
        return Err(error(
            StatusCode::CONFLICT,
            "Email already registered",
            "EMAIL_TAKEN",
        ));
    }

    let password_hash = hash_password(&request.password).map_err(|e| {
        warn!(error = %e, "Password hashing failed");
        error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
            "INTERNAL_ERROR",
        )
    })?;

    let now = chrono::Utc::now();
    let account = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        display_name: Set(request.display_name),
        // New accounts start at the bottom of the ladder; promotion is a
        // super-admin operation.
        role: Set(GlobalRole::Viewer),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(db_error)?;

    info!(user_id = %account.id, "Account registered");

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Get the authenticated account
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current account", body = User),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    let (account, _) = load_principal(&state, &auth).await?;
    Ok(Json(account.into()))
}

// ---------------------------------------------------------------
// Permissions and workspace
// ---------------------------------------------------------------

/// Get the caller's effective capability set
#[utoipa::path(
    get,
    path = "/api/permissions",
    responses(
        (status = 200, description = "Capability set for the caller's role", body = PermissionsResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "permissions"
)]
pub async fn get_permissions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    Ok(Json(PermissionsResponse::for_role(principal.role)))
}

/// Resolve the caller's workspace
#[utoipa::path(
    get,
    path = "/api/workspace",
    responses(
        (status = 200, description = "Workspace the caller's writes are attributed to", body = WorkspaceResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "workspace"
)]
pub async fn get_workspace(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<WorkspaceResponse>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    Ok(Json(ctx.into()))
}

// ---------------------------------------------------------------
// Client access codes
// ---------------------------------------------------------------

/// List access codes issued under the caller's workspace
#[utoipa::path(
    get,
    path = "/api/access-tokens",
    responses(
        (status = 200, description = "Access codes for the workspace", body = AccessCodeList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "access-tokens"
)]
pub async fn list_access_codes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AccessCodeList>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    let tokens = state
        .codes
        .list_for_workspace(&ctx)
        .await
        .map_err(map_access_error)?;

    let codes: Vec<AccessCode> = tokens.into_iter().map(Into::into).collect();
    let total = codes.len();

    Ok(Json(AccessCodeList { codes, total }))
}

/// Issue a new access code
#[utoipa::path(
    post,
    path = "/api/access-tokens",
    request_body = IssueAccessCodeRequest,
    responses(
        (status = 201, description = "Access code issued", body = AccessCode),
        (status = 400, description = "Recipient outside the caller's workspace", body = ErrorResponse),
        (status = 403, description = "Caller may not issue codes", body = ErrorResponse)
    ),
    tag = "access-tokens"
)]
pub async fn issue_access_code(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<IssueAccessCodeRequest>,
) -> Result<(StatusCode, Json<AccessCode>), ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    let token = state
        .codes
        .issue(
            &principal,
            &ctx,
            request.recipient_id,
            request.access_level.into(),
            request.expires_at,
        )
        .await
        .map_err(map_access_error)?;

    Ok((StatusCode::CREATED, Json(token.into())))
}

/// Revoke an access code
#[utoipa::path(
    post,
    path = "/api/access-tokens/{id}/revoke",
    params(
        ("id" = Uuid, Path, description = "Access code id")
    ),
    responses(
        (status = 204, description = "Code revoked (idempotent)"),
        (status = 404, description = "No such code in the caller's workspace", body = ErrorResponse)
    ),
    tag = "access-tokens"
)]
pub async fn revoke_access_code(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    state
        .codes
        .revoke(&ctx, id)
        .await
        .map_err(map_access_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Validate a code presented by an external viewer (no account required)
#[utoipa::path(
    post,
    path = "/api/access-tokens/validate",
    request_body = ValidateAccessCodeRequest,
    responses(
        (status = 200, description = "Code is valid", body = ValidateAccessCodeResponse),
        (status = 404, description = "Unknown or revoked code", body = ErrorResponse),
        (status = 410, description = "Code expired", body = ErrorResponse)
    ),
    tag = "access-tokens"
)]
pub async fn validate_access_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateAccessCodeRequest>,
) -> Result<Json<ValidateAccessCodeResponse>, ApiError> {
    let token = state
        .codes
        .validate(request.code.trim())
        .await
        .map_err(map_access_error)?;

    Ok(Json(ValidateAccessCodeResponse {
        recipient_id: token.recipient_id,
        access_level: token.access_level.into(),
    }))
}

// ---------------------------------------------------------------
// Team
// ---------------------------------------------------------------

/// List workspace memberships
#[utoipa::path(
    get,
    path = "/api/team",
    responses(
        (status = 200, description = "Memberships in the caller's workspace", body = TeamMemberList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "team"
)]
pub async fn list_team(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<TeamMemberList>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    let memberships = state
        .memberships
        .list(&ctx)
        .await
        .map_err(map_access_error)?;

    let members: Vec<TeamMember> = memberships.into_iter().map(Into::into).collect();
    let total = members.len();

    Ok(Json(TeamMemberList { members, total }))
}

/// Invite someone into the caller's workspace
#[utoipa::path(
    post,
    path = "/api/team/invites",
    request_body = InviteTeamMemberRequest,
    responses(
        (status = 201, description = "Invite created", body = TeamMember),
        (status = 400, description = "Invalid or duplicate email", body = ErrorResponse),
        (status = 403, description = "Caller may not manage the team", body = ErrorResponse)
    ),
    tag = "team"
)]
pub async fn invite_team_member(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<InviteTeamMemberRequest>,
) -> Result<(StatusCode, Json<TeamMember>), ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    let membership = state
        .memberships
        .invite(
            &principal,
            &ctx,
            &request.email,
            request.role.into(),
            request.recipient_ids,
        )
        .await
        .map_err(map_access_error)?;

    Ok((StatusCode::CREATED, Json(membership.into())))
}

/// Accept an invite addressed to the caller
#[utoipa::path(
    post,
    path = "/api/team/invites/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Invite id")
    ),
    responses(
        (status = 200, description = "Invite accepted", body = TeamMember),
        (status = 404, description = "No pending invite for this caller", body = ErrorResponse)
    ),
    tag = "team"
)]
pub async fn accept_invite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMember>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;

    let membership = state
        .memberships
        .accept(id, &principal)
        .await
        .map_err(map_access_error)?;

    Ok(Json(membership.into()))
}

/// Remove a member from the caller's workspace
#[utoipa::path(
    post,
    path = "/api/team/members/{id}/remove",
    params(
        ("id" = Uuid, Path, description = "Membership id")
    ),
    responses(
        (status = 204, description = "Member removed (idempotent)"),
        (status = 403, description = "Caller may not manage the team", body = ErrorResponse),
        (status = 404, description = "No such membership", body = ErrorResponse)
    ),
    tag = "team"
)]
pub async fn remove_team_member(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    state
        .memberships
        .remove(&principal, &ctx, id)
        .await
        .map_err(map_access_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------
// Notes
// ---------------------------------------------------------------

/// List care notes visible to the caller
#[utoipa::path(
    get,
    path = "/api/notes",
    responses(
        (status = 200, description = "Notes in the caller's workspace", body = NoteList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<NoteList>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    let records = state.notes.list(&ctx).await.map_err(map_access_error)?;

    let notes: Vec<Note> = records.into_iter().map(Into::into).collect();
    let total = notes.len();

    Ok(Json(NoteList { notes, total }))
}

/// Create a care note
#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created with its attribution pair", body = Note),
        (status = 400, description = "Recipient outside the caller's workspace", body = ErrorResponse),
        (status = 403, description = "Caller may not edit records", body = ErrorResponse)
    ),
    tag = "notes"
)]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;
    let ctx = state
        .resolver
        .resolve(principal.id)
        .await
        .map_err(map_access_error)?;

    let note = state
        .notes
        .create(&principal, &ctx, request.recipient_id, request.body)
        .await
        .map_err(map_access_error)?;

    Ok((StatusCode::CREATED, Json(note.into())))
}

// ---------------------------------------------------------------
// Admin
// ---------------------------------------------------------------

/// Query the admin activity feed
#[utoipa::path(
    get,
    path = "/api/admin/activity",
    params(ActivityQuery),
    responses(
        (status = 200, description = "One page of activity entries", body = ActivityPageResponse),
        (status = 400, description = "Unknown action or target type filter", body = ErrorResponse),
        (status = 403, description = "Caller may not view audit logs", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_activity(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityPageResponse>, ApiError> {
    debug!("Listing admin activity with filters: {:?}", query);

    let (_, principal) = load_principal(&state, &auth).await?;

    let action = query
        .action
        .map(|s| AdminAction::try_from_value(&s))
        .transpose()
        .map_err(|_| error(StatusCode::BAD_REQUEST, "Unknown action filter", "INVALID_FILTER"))?;
    let target_type = query
        .target_type
        .map(|s| AdminTargetType::try_from_value(&s))
        .transpose()
        .map_err(|_| {
            error(
                StatusCode::BAD_REQUEST,
                "Unknown target type filter",
                "INVALID_FILTER",
            )
        })?;

    let filter = ActivityFilter {
        admin_id: query.admin_id,
        action,
        target_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let page = state
        .activity
        .query(
            &principal,
            &filter,
            query.page.unwrap_or(0),
            query.page_size.unwrap_or(50),
        )
        .await
        .map_err(map_access_error)?;

    Ok(Json(ActivityPageResponse {
        entries: page.entries.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

/// Rolling activity counts
#[utoipa::path(
    get,
    path = "/api/admin/activity/stats",
    responses(
        (status = 200, description = "Entry counts over rolling windows", body = ActivityStatsResponse),
        (status = 403, description = "Caller may not view audit logs", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn activity_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ActivityStatsResponse>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;

    let stats = state
        .activity
        .stats(&principal)
        .await
        .map_err(map_access_error)?;

    Ok(Json(ActivityStatsResponse {
        last_24h: stats.last_24h,
        last_7d: stats.last_7d,
    }))
}

/// Change a user's global role
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/role",
    params(
        ("id" = Uuid, Path, description = "Target user id")
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 403, description = "Caller may not manage users", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn change_user_role(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Json<User>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;

    let updated = state
        .admin
        .change_role(&principal, id, request.role.into())
        .await
        .map_err(map_access_error)?;

    Ok(Json(updated.into()))
}

/// Enable or disable an account
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/active",
    params(
        ("id" = Uuid, Path, description = "Target user id")
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Active flag updated", body = User),
        (status = 403, description = "Caller may not manage users", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<User>, ApiError> {
    let (_, principal) = load_principal(&state, &auth).await?;

    let updated = state
        .admin
        .set_active(&principal, id, request.is_active)
        .await
        .map_err(map_access_error)?;

    Ok(Json(updated.into()))
}
