//! Integration tests for carebridge-db
//!
//! Exercises the schema against a real SQLite in-memory database.

use carebridge_db::entities::{
    admin_activity_log, care_recipient, client_access_token, note, team_member, user,
};
use carebridge_db::{connect, migrate};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

/// Helper to create a migrated test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn insert_user(
    db: &sea_orm::DatabaseConnection,
    email: &str,
    role: user::GlobalRole,
) -> user::Model {
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
    .expect("Failed to insert user")
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_user_role_round_trips_as_string_enum() {
    let db = setup_test_db().await;

    let owner = insert_user(&db, "owner@example.com", user::GlobalRole::SuperAdmin).await;

    let found = user::Entity::find_by_id(owner.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("User not found");

    assert_eq!(found.role, user::GlobalRole::SuperAdmin);
    assert_eq!(found.email, "owner@example.com");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = setup_test_db().await;

    insert_user(&db, "dup@example.com", user::GlobalRole::Viewer).await;

    let second = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set("dup@example.com".to_string()),
        password_hash: Set("$argon2id$stub".to_string()),
        display_name: Set(None),
        role: Set(user::GlobalRole::Viewer),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await;

    assert!(second.is_err());
}

#[tokio::test]
async fn test_optional_columns_accept_null() {
    let db = setup_test_db().await;

    // A user without a display name is valid
    let owner = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set("anon@example.com".to_string()),
        password_hash: Set("$argon2id$stub".to_string()),
        display_name: Set(None),
        role: Set(user::GlobalRole::Admin),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert user without display name");
    assert!(owner.display_name.is_none());

    let recipient = care_recipient::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        full_name: Set("Aunt Clara".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert recipient");

    // A freshly issued token has neither expiry nor access timestamp
    let token = client_access_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set("WXYZ2345".to_string()),
        user_id: Set(owner.id),
        recipient_id: Set(recipient.id),
        access_level: Set(client_access_token::AccessLevel::ReadFull),
        is_active: Set(true),
        expires_at: Set(None),
        last_accessed_at: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert token without expiry");
    assert!(token.expires_at.is_none());
    assert!(token.last_accessed_at.is_none());

    // A pending invite has no accepted or removed timestamp yet
    let membership = team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        member_id: Set(None),
        invited_email: Set("pending@example.com".to_string()),
        role: Set(team_member::MembershipRole::Caregiver),
        status: Set(team_member::MembershipStatus::Pending),
        recipient_ids: Set(None),
        invited_at: Set(Utc::now()),
        accepted_at: Set(None),
        removed_at: Set(None),
    }
    .insert(&db)
    .await
    .expect("Failed to insert pending invite");
    assert!(membership.accepted_at.is_none());
    assert!(membership.removed_at.is_none());
}

#[tokio::test]
async fn test_membership_lifecycle_columns() {
    let db = setup_test_db().await;

    let owner = insert_user(&db, "owner@example.com", user::GlobalRole::Admin).await;

    let membership = team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        member_id: Set(None),
        invited_email: Set("helper@example.com".to_string()),
        role: Set(team_member::MembershipRole::Caregiver),
        status: Set(team_member::MembershipStatus::Pending),
        recipient_ids: Set(None),
        invited_at: Set(Utc::now()),
        accepted_at: Set(None),
        removed_at: Set(None),
    }
    .insert(&db)
    .await
    .expect("Failed to insert membership");

    assert!(membership.member_id.is_none());
    assert_eq!(membership.status, team_member::MembershipStatus::Pending);

    // Accept: link the member and flip status
    let member = insert_user(&db, "helper@example.com", user::GlobalRole::Viewer).await;
    let mut active: team_member::ActiveModel = membership.into();
    active.member_id = Set(Some(member.id));
    active.status = Set(team_member::MembershipStatus::Accepted);
    active.accepted_at = Set(Some(Utc::now()));

    let accepted = active.update(&db).await.expect("Failed to update");
    assert_eq!(accepted.status, team_member::MembershipStatus::Accepted);
    assert_eq!(accepted.member_id, Some(member.id));
}

#[tokio::test]
async fn test_membership_recipient_subset_stored_as_json() {
    let db = setup_test_db().await;

    let owner = insert_user(&db, "owner@example.com", user::GlobalRole::Admin).await;
    let subset = vec![Uuid::new_v4(), Uuid::new_v4()];

    let membership = team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        member_id: Set(None),
        invited_email: Set("scoped@example.com".to_string()),
        role: Set(team_member::MembershipRole::Viewer),
        status: Set(team_member::MembershipStatus::Pending),
        recipient_ids: Set(Some(serde_json::json!(subset))),
        invited_at: Set(Utc::now()),
        accepted_at: Set(None),
        removed_at: Set(None),
    }
    .insert(&db)
    .await
    .expect("Failed to insert membership");

    let decoded: Vec<Uuid> =
        serde_json::from_value(membership.recipient_ids.clone().unwrap()).unwrap();
    assert_eq!(decoded, subset);
}

#[tokio::test]
async fn test_note_dual_attribution_columns() {
    let db = setup_test_db().await;

    let owner = insert_user(&db, "owner@example.com", user::GlobalRole::Admin).await;
    let author = insert_user(&db, "helper@example.com", user::GlobalRole::Caregiver).await;

    let recipient = care_recipient::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        full_name: Set("Grandma Ada".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert recipient");

    let note = note::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        author_id: Set(author.id),
        recipient_id: Set(recipient.id),
        body: Set("Slept well, ate breakfast.".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert note");

    assert_eq!(note.user_id, owner.id);
    assert_eq!(note.author_id, author.id);
    assert_ne!(note.user_id, note.author_id);
}

#[tokio::test]
async fn test_access_token_code_is_unique() {
    let db = setup_test_db().await;

    let owner = insert_user(&db, "owner@example.com", user::GlobalRole::Admin).await;
    let recipient = care_recipient::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        full_name: Set("Grandpa Bob".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert recipient");

    let token = client_access_token::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set("ABCD2345".to_string()),
        user_id: Set(owner.id),
        recipient_id: Set(recipient.id),
        access_level: Set(client_access_token::AccessLevel::ReadSummary),
        is_active: Set(true),
        expires_at: Set(None),
        last_accessed_at: Set(None),
        created_at: Set(Utc::now()),
    };

    token.clone().insert(&db).await.expect("Failed to insert");

    let mut duplicate = token;
    duplicate.id = Set(Uuid::new_v4());
    assert!(duplicate.insert(&db).await.is_err());
}

#[tokio::test]
async fn test_activity_log_append_and_filter() {
    let db = setup_test_db().await;

    let admin = insert_user(&db, "root@example.com", user::GlobalRole::SuperAdmin).await;
    let target = insert_user(&db, "target@example.com", user::GlobalRole::Viewer).await;

    for action in [
        admin_activity_log::AdminAction::RoleChanged,
        admin_activity_log::AdminAction::UserDisabled,
    ] {
        admin_activity_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            admin_id: Set(admin.id),
            action: Set(action),
            target_type: Set(admin_activity_log::AdminTargetType::User),
            target_id: Set(Some(target.id)),
            details: Set(serde_json::json!({"via": "test"})),
            created_at: Set(Utc::now()),
        }
        .insert(&db)
        .await
        .expect("Failed to append entry");
    }

    let role_changes = admin_activity_log::Entity::find()
        .filter(
            admin_activity_log::Column::Action.eq(admin_activity_log::AdminAction::RoleChanged),
        )
        .count(&db)
        .await
        .expect("Failed to count");

    assert_eq!(role_changes, 1);
}
