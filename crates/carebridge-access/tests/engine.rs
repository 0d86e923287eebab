//! Integration tests for the access-control engine
//!
//! Runs the delegation resolver, access code service, activity log and
//! membership lifecycle against a real SQLite in-memory database.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use carebridge_access::{
    principal_for, AccessCodeService, AccessError, ActivityFilter, ActivityLog, AdminOps,
    Capability, MembershipService, NoteService, Role, WorkspaceResolver, CODE_ALPHABET,
    CODE_LENGTH,
};
use carebridge_db::entities::admin_activity_log::{AdminAction, AdminTargetType};
use carebridge_db::entities::client_access_token::AccessLevel;
use carebridge_db::entities::team_member::{MembershipRole, MembershipStatus};
use carebridge_db::entities::{care_recipient, team_member, user};
use carebridge_db::{connect, migrate};

struct Harness {
    db: DatabaseConnection,
    resolver: WorkspaceResolver,
    codes: AccessCodeService,
    activity: ActivityLog,
    memberships: MembershipService,
    notes: NoteService,
    admin: AdminOps,
}

async fn setup() -> Harness {
    let db = connect("sqlite::memory:").await.expect("connect failed");
    migrate(&db).await.expect("migrate failed");

    let resolver = WorkspaceResolver::new(db.clone());
    let activity = ActivityLog::new(db.clone());

    Harness {
        codes: AccessCodeService::new(db.clone()),
        memberships: MembershipService::new(db.clone(), resolver.clone(), activity.clone()),
        notes: NoteService::new(db.clone()),
        admin: AdminOps::new(db.clone(), activity.clone()),
        resolver,
        activity,
        db,
    }
}

async fn insert_user(db: &DatabaseConnection, email: &str, role: user::GlobalRole) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("$argon2id$stub".to_string()),
        display_name: Set(Some(email.split('@').next().unwrap().to_string())),
        role: Set(role),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert user failed")
}

async fn insert_recipient(
    db: &DatabaseConnection,
    owner_id: Uuid,
    name: &str,
) -> care_recipient::Model {
    care_recipient::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner_id),
        full_name: Set(name.to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("insert recipient failed")
}

// ---------------------------------------------------------------
// Workspace delegation
// ---------------------------------------------------------------

#[tokio::test]
async fn test_owner_without_memberships_resolves_self() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;

    let ctx = h.resolver.resolve(owner.id).await.unwrap();

    assert_eq!(ctx.attribution_id, owner.id);
    assert!(!ctx.is_team_member);
    assert_eq!(ctx.workspace_role, MembershipRole::Owner);
    assert!(ctx.assigned_recipient_ids.is_none());
}

#[tokio::test]
async fn test_accepted_member_resolves_owner_attribution() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let member = insert_user(&h.db, "helper@example.com", user::GlobalRole::Caregiver).await;

    team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        member_id: Set(Some(member.id)),
        invited_email: Set(member.email.clone()),
        role: Set(MembershipRole::Caregiver),
        status: Set(MembershipStatus::Accepted),
        recipient_ids: Set(None),
        invited_at: Set(Utc::now()),
        accepted_at: Set(Some(Utc::now())),
        removed_at: Set(None),
    }
    .insert(&h.db)
    .await
    .unwrap();

    let ctx = h.resolver.resolve(member.id).await.unwrap();

    assert_eq!(ctx.attribution_id, owner.id);
    assert!(ctx.is_team_member);
    assert_eq!(ctx.workspace_role, MembershipRole::Caregiver);
    assert_eq!(ctx.owner_display_name.as_deref(), Some("owner"));
}

#[tokio::test]
async fn test_pending_membership_resolves_as_self_owned() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let member = insert_user(&h.db, "helper@example.com", user::GlobalRole::Viewer).await;

    team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        member_id: Set(Some(member.id)),
        invited_email: Set(member.email.clone()),
        role: Set(MembershipRole::Viewer),
        status: Set(MembershipStatus::Pending),
        recipient_ids: Set(None),
        invited_at: Set(Utc::now()),
        accepted_at: Set(None),
        removed_at: Set(None),
    }
    .insert(&h.db)
    .await
    .unwrap();

    let ctx = h.resolver.resolve(member.id).await.unwrap();

    assert_eq!(ctx.attribution_id, member.id);
    assert!(!ctx.is_team_member);
}

#[tokio::test]
async fn test_membership_change_invisible_until_invalidated() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let member = insert_user(&h.db, "helper@example.com", user::GlobalRole::Caregiver).await;

    // Prime the cache with the self-owned resolution.
    let before = h.resolver.resolve(member.id).await.unwrap();
    assert_eq!(before.attribution_id, member.id);

    team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        member_id: Set(Some(member.id)),
        invited_email: Set(member.email.clone()),
        role: Set(MembershipRole::Caregiver),
        status: Set(MembershipStatus::Accepted),
        recipient_ids: Set(None),
        invited_at: Set(Utc::now()),
        accepted_at: Set(Some(Utc::now())),
        removed_at: Set(None),
    }
    .insert(&h.db)
    .await
    .unwrap();

    // Still the stale self-owned view within the TTL.
    let stale = h.resolver.resolve(member.id).await.unwrap();
    assert_eq!(stale.attribution_id, member.id);

    // After invalidation the delegation is visible immediately.
    h.resolver.invalidate(member.id);
    let fresh = h.resolver.resolve(member.id).await.unwrap();
    assert_eq!(fresh.attribution_id, owner.id);
}

// ---------------------------------------------------------------
// Client access codes
// ---------------------------------------------------------------

#[tokio::test]
async fn test_issue_rejects_foreign_recipient() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let stranger = insert_user(&h.db, "stranger@example.com", user::GlobalRole::Admin).await;
    let foreign = insert_recipient(&h.db, stranger.id, "Someone Else").await;

    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let result = h
        .codes
        .issue(
            &principal_for(&owner),
            &ctx,
            foreign.id,
            AccessLevel::ReadSummary,
            None,
        )
        .await;

    assert!(matches!(result, Err(AccessError::Validation(_))));
}

#[tokio::test]
async fn test_issue_owned_recipient_yields_alphabet_code() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let recipient = insert_recipient(&h.db, owner.id, "Grandma Ada").await;

    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let token = h
        .codes
        .issue(
            &principal_for(&owner),
            &ctx,
            recipient.id,
            AccessLevel::ReadFull,
            None,
        )
        .await
        .unwrap();

    assert_eq!(token.code.len(), CODE_LENGTH);
    assert!(token.code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    assert!(token.is_active);
    assert_eq!(token.user_id, owner.id);
}

#[tokio::test]
async fn test_issue_denied_without_edit_records() {
    let h = setup().await;
    let viewer = insert_user(&h.db, "viewer@example.com", user::GlobalRole::Viewer).await;
    let recipient = insert_recipient(&h.db, viewer.id, "Grandpa Bob").await;

    let ctx = h.resolver.resolve(viewer.id).await.unwrap();
    let result = h
        .codes
        .issue(
            &principal_for(&viewer),
            &ctx,
            recipient.id,
            AccessLevel::ReadSummary,
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(AccessError::PermissionDenied(Capability::EditRecords))
    ));
}

#[tokio::test]
async fn test_validate_is_repeatable_and_stamps_access_time() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let recipient = insert_recipient(&h.db, owner.id, "Grandma Ada").await;

    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let token = h
        .codes
        .issue(
            &principal_for(&owner),
            &ctx,
            recipient.id,
            AccessLevel::ReadSummary,
            None,
        )
        .await
        .unwrap();

    let first = h.codes.validate(&token.code).await.unwrap();
    assert_eq!(first.recipient_id, recipient.id);
    assert_eq!(first.access_level, AccessLevel::ReadSummary);

    // Validation does not consume the code.
    let second = h.codes.validate(&token.code).await.unwrap();
    assert_eq!(second.id, token.id);

    let stored = carebridge_db::entities::ClientAccessToken::find_by_id(token.id)
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_accessed_at.is_some());
}

#[tokio::test]
async fn test_validate_expired_code() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let recipient = insert_recipient(&h.db, owner.id, "Grandma Ada").await;

    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let token = h
        .codes
        .issue(
            &principal_for(&owner),
            &ctx,
            recipient.id,
            AccessLevel::ReadSummary,
            Some(Utc::now() - Duration::minutes(5)),
        )
        .await
        .unwrap();

    // The expired row persists; validation is the authoritative gate.
    let result = h.codes.validate(&token.code).await;
    assert!(matches!(result, Err(AccessError::Expired)));
}

#[tokio::test]
async fn test_validate_unknown_code_is_not_found() {
    let h = setup().await;
    let result = h.codes.validate("ZZZZ9999").await;
    assert!(matches!(result, Err(AccessError::NotFound)));
}

#[tokio::test]
async fn test_revoke_is_idempotent_and_kills_the_code() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let recipient = insert_recipient(&h.db, owner.id, "Grandma Ada").await;

    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let token = h
        .codes
        .issue(
            &principal_for(&owner),
            &ctx,
            recipient.id,
            AccessLevel::ReadFull,
            None,
        )
        .await
        .unwrap();

    h.codes.revoke(&ctx, token.id).await.unwrap();
    // Second revoke is a no-op success.
    h.codes.revoke(&ctx, token.id).await.unwrap();

    // A revoked code is indistinguishable from an unknown one.
    let result = h.codes.validate(&token.code).await;
    assert!(matches!(result, Err(AccessError::NotFound)));
}

#[tokio::test]
async fn test_revoke_unknown_token_is_not_found() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let ctx = h.resolver.resolve(owner.id).await.unwrap();

    let result = h.codes.revoke(&ctx, Uuid::new_v4()).await;
    assert!(matches!(result, Err(AccessError::NotFound)));
}

#[tokio::test]
async fn test_revoke_foreign_token_looks_absent() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let stranger = insert_user(&h.db, "stranger@example.com", user::GlobalRole::Admin).await;
    let recipient = insert_recipient(&h.db, owner.id, "Grandma Ada").await;

    let owner_ctx = h.resolver.resolve(owner.id).await.unwrap();
    let token = h
        .codes
        .issue(
            &principal_for(&owner),
            &owner_ctx,
            recipient.id,
            AccessLevel::ReadFull,
            None,
        )
        .await
        .unwrap();

    let stranger_ctx = h.resolver.resolve(stranger.id).await.unwrap();
    let result = h.codes.revoke(&stranger_ctx, token.id).await;
    assert!(matches!(result, Err(AccessError::NotFound)));

    // Untouched; still validates.
    assert!(h.codes.validate(&token.code).await.is_ok());
}

// ---------------------------------------------------------------
// Admin activity log
// ---------------------------------------------------------------

#[tokio::test]
async fn test_audit_query_requires_admin() {
    let h = setup().await;
    let caregiver = insert_user(&h.db, "helper@example.com", user::GlobalRole::Caregiver).await;

    let result = h
        .activity
        .query(&principal_for(&caregiver), &ActivityFilter::default(), 0, 20)
        .await;

    assert!(matches!(
        result,
        Err(AccessError::PermissionDenied(Capability::ViewAuditLogs))
    ));
}

#[tokio::test]
async fn test_audit_entries_newest_first_with_filters() {
    let h = setup().await;
    let root = insert_user(&h.db, "root@example.com", user::GlobalRole::SuperAdmin).await;
    let target = insert_user(&h.db, "target@example.com", user::GlobalRole::Viewer).await;

    h.activity
        .record(
            root.id,
            AdminAction::UserDisabled,
            AdminTargetType::User,
            Some(target.id),
            serde_json::json!({}),
        )
        .await;
    h.activity
        .record(
            root.id,
            AdminAction::RoleChanged,
            AdminTargetType::User,
            Some(target.id),
            serde_json::json!({"from": "viewer", "to": "admin"}),
        )
        .await;

    let all = h
        .activity
        .query(&principal_for(&root), &ActivityFilter::default(), 0, 20)
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let filter = ActivityFilter {
        action: Some(AdminAction::RoleChanged),
        ..Default::default()
    };
    let filtered = h
        .activity
        .query(&principal_for(&root), &filter, 0, 20)
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
    assert_eq!(filtered.entries[0].action, AdminAction::RoleChanged);
}

#[tokio::test]
async fn test_audit_stats_windows() {
    let h = setup().await;
    let root = insert_user(&h.db, "root@example.com", user::GlobalRole::SuperAdmin).await;

    h.activity
        .record(
            root.id,
            AdminAction::SettingUpdated,
            AdminTargetType::Setting,
            None,
            serde_json::json!({"key": "timezone"}),
        )
        .await;

    let stats = h.activity.stats(&principal_for(&root)).await.unwrap();
    assert_eq!(stats.last_24h, 1);
    assert_eq!(stats.last_7d, 1);
}

#[tokio::test]
async fn test_role_change_survives_audit_storage_failure() {
    let h = setup().await;
    let root = insert_user(&h.db, "root@example.com", user::GlobalRole::SuperAdmin).await;
    let target = insert_user(&h.db, "target@example.com", user::GlobalRole::Viewer).await;

    // Simulated audit outage: the table is gone.
    h.db.execute_unprepared("DROP TABLE admin_activity_logs")
        .await
        .unwrap();

    let updated = h
        .admin
        .change_role(&principal_for(&root), target.id, Role::Caregiver)
        .await
        .expect("role change must succeed despite audit failure");

    assert_eq!(updated.role, user::GlobalRole::Caregiver);
}

#[tokio::test]
async fn test_role_change_requires_super_admin() {
    let h = setup().await;
    let admin = insert_user(&h.db, "admin@example.com", user::GlobalRole::Admin).await;
    let target = insert_user(&h.db, "target@example.com", user::GlobalRole::Viewer).await;

    let result = h
        .admin
        .change_role(&principal_for(&admin), target.id, Role::Admin)
        .await;

    assert!(matches!(
        result,
        Err(AccessError::PermissionDenied(Capability::ManageUsers))
    ));
}

// ---------------------------------------------------------------
// Membership lifecycle
// ---------------------------------------------------------------

#[tokio::test]
async fn test_invite_duplicate_email_rejected() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let principal = principal_for(&owner);

    h.memberships
        .invite(&principal, &ctx, "helper@example.com", MembershipRole::Caregiver, None)
        .await
        .unwrap();

    let duplicate = h
        .memberships
        .invite(&principal, &ctx, "Helper@Example.com", MembershipRole::Viewer, None)
        .await;

    assert!(matches!(duplicate, Err(AccessError::Validation(_))));
}

#[tokio::test]
async fn test_invite_requires_manage_team() {
    let h = setup().await;
    let caregiver = insert_user(&h.db, "helper@example.com", user::GlobalRole::Caregiver).await;
    let ctx = h.resolver.resolve(caregiver.id).await.unwrap();

    let result = h
        .memberships
        .invite(
            &principal_for(&caregiver),
            &ctx,
            "other@example.com",
            MembershipRole::Viewer,
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(AccessError::PermissionDenied(Capability::ManageTeam))
    ));
}

#[tokio::test]
async fn test_accept_wrong_email_looks_absent() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let interloper = insert_user(&h.db, "interloper@example.com", user::GlobalRole::Viewer).await;
    let ctx = h.resolver.resolve(owner.id).await.unwrap();

    let invite = h
        .memberships
        .invite(
            &principal_for(&owner),
            &ctx,
            "helper@example.com",
            MembershipRole::Caregiver,
            None,
        )
        .await
        .unwrap();

    let result = h.memberships.accept(invite.id, &principal_for(&interloper)).await;
    assert!(matches!(result, Err(AccessError::NotFound)));
}

#[tokio::test]
async fn test_accept_second_workspace_rejected() {
    let h = setup().await;
    let first_owner = insert_user(&h.db, "first@example.com", user::GlobalRole::Admin).await;
    let second_owner = insert_user(&h.db, "second@example.com", user::GlobalRole::Admin).await;
    let helper = insert_user(&h.db, "helper@example.com", user::GlobalRole::Caregiver).await;
    let helper_principal = principal_for(&helper);

    // Both owners invite the same address.
    let first_ctx = h.resolver.resolve(first_owner.id).await.unwrap();
    let first_invite = h
        .memberships
        .invite(
            &principal_for(&first_owner),
            &first_ctx,
            "helper@example.com",
            MembershipRole::Caregiver,
            None,
        )
        .await
        .unwrap();
    let second_ctx = h.resolver.resolve(second_owner.id).await.unwrap();
    let second_invite = h
        .memberships
        .invite(
            &principal_for(&second_owner),
            &second_ctx,
            "helper@example.com",
            MembershipRole::Caregiver,
            None,
        )
        .await
        .unwrap();

    h.memberships
        .accept(first_invite.id, &helper_principal)
        .await
        .unwrap();

    // A second acceptance would make attribution ambiguous.
    let result = h.memberships.accept(second_invite.id, &helper_principal).await;
    assert!(matches!(result, Err(AccessError::Conflict(_))));

    // Attribution stays pinned to the first workspace.
    let resolved = h.resolver.resolve(helper.id).await.unwrap();
    assert_eq!(resolved.attribution_id, first_owner.id);

    // The declined invite is still pending; the first owner can be left
    // and the second joined later.
    let stored = carebridge_db::entities::TeamMember::find_by_id(second_invite.id)
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, MembershipStatus::Pending);
}

#[tokio::test]
async fn test_remove_is_soft_and_idempotent() {
    let h = setup().await;
    let owner = insert_user(&h.db, "owner@example.com", user::GlobalRole::Admin).await;
    let member = insert_user(&h.db, "helper@example.com", user::GlobalRole::Caregiver).await;
    let ctx = h.resolver.resolve(owner.id).await.unwrap();
    let owner_principal = principal_for(&owner);

    let invite = h
        .memberships
        .invite(
            &owner_principal,
            &ctx,
            "helper@example.com",
            MembershipRole::Caregiver,
            None,
        )
        .await
        .unwrap();
    h.memberships
        .accept(invite.id, &principal_for(&member))
        .await
        .unwrap();

    h.memberships.remove(&owner_principal, &ctx, invite.id).await.unwrap();
    // Second removal is a no-op.
    h.memberships.remove(&owner_principal, &ctx, invite.id).await.unwrap();

    // The row survives with a terminal status for attribution history.
    let stored = carebridge_db::entities::TeamMember::find_by_id(invite.id)
        .one(&h.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, MembershipStatus::Removed);
    assert!(stored.removed_at.is_some());

    // And the removed member resolves as self-owned again.
    let resolved = h.resolver.resolve(member.id).await.unwrap();
    assert_eq!(resolved.attribution_id, member.id);
}

// ---------------------------------------------------------------
// End-to-end attribution scenario
// ---------------------------------------------------------------

#[tokio::test]
async fn test_end_to_end_delegation_attribution_and_access_code() {
    let h = setup().await;

    let owner = insert_user(&h.db, "olivia@example.com", user::GlobalRole::Admin).await;
    let member = insert_user(&h.db, "marta@example.com", user::GlobalRole::Caregiver).await;
    let recipient = insert_recipient(&h.db, owner.id, "Grandma Ada").await;

    let owner_principal = principal_for(&owner);
    let member_principal = principal_for(&member);

    // Owner invites, member accepts.
    let owner_ctx = h.resolver.resolve(owner.id).await.unwrap();
    let invite = h
        .memberships
        .invite(
            &owner_principal,
            &owner_ctx,
            "marta@example.com",
            MembershipRole::Caregiver,
            None,
        )
        .await
        .unwrap();
    h.memberships
        .accept(invite.id, &member_principal)
        .await
        .unwrap();

    // Member writes a note: filed under the owner, authored by the member.
    let member_ctx = h.resolver.resolve(member.id).await.unwrap();
    assert_eq!(member_ctx.attribution_id, owner.id);

    let note = h
        .notes
        .create(
            &member_principal,
            &member_ctx,
            recipient.id,
            "Morning walk went well.".to_string(),
        )
        .await
        .unwrap();

    assert_eq!(note.user_id, owner.id);
    assert_eq!(note.author_id, member.id);

    // Owner issues a summary code for the recipient.
    let token = h
        .codes
        .issue(
            &owner_principal,
            &owner_ctx,
            recipient.id,
            AccessLevel::ReadSummary,
            None,
        )
        .await
        .unwrap();

    // External caller validates and learns only recipient + level.
    let validated = h.codes.validate(&token.code).await.unwrap();
    assert_eq!(validated.recipient_id, recipient.id);
    assert_eq!(validated.access_level, AccessLevel::ReadSummary);

    // Owner revokes; the same code is now unusable.
    h.codes.revoke(&owner_ctx, token.id).await.unwrap();
    assert!(matches!(
        h.codes.validate(&token.code).await,
        Err(AccessError::NotFound)
    ));
}
