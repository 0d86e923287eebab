//! Consolidated initial schema migration

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len_null(User::DisplayName, 255))
                    .col(string_len(User::Role, 32).not_null().default("viewer"))
                    .col(boolean(User::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(User::Table)
                    .col(User::Email)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create team_members table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(uuid(TeamMember::Id).primary_key())
                    .col(uuid(TeamMember::OwnerId).not_null())
                    .col(ColumnDef::new(TeamMember::MemberId).uuid().null())
                    .col(string_len(TeamMember::InvitedEmail, 255).not_null())
                    .col(
                        string_len(TeamMember::Role, 32)
                            .not_null()
                            .default("viewer"),
                    )
                    .col(
                        string_len(TeamMember::Status, 32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(TeamMember::RecipientIds).json().null())
                    .col(
                        timestamp_with_time_zone(TeamMember::InvitedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(TeamMember::AcceptedAt))
                    .col(timestamp_with_time_zone_null(TeamMember::RemovedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_owner_id")
                            .from(TeamMember::Table, TeamMember::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_owner_id")
                    .table(TeamMember::Table)
                    .col(TeamMember::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_member_id")
                    .table(TeamMember::Table)
                    .col(TeamMember::MemberId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_team_members_invited_email")
                    .table(TeamMember::Table)
                    .col(TeamMember::InvitedEmail)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create care_recipients table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(CareRecipient::Table)
                    .if_not_exists()
                    .col(uuid(CareRecipient::Id).primary_key())
                    .col(uuid(CareRecipient::UserId).not_null())
                    .col(string_len(CareRecipient::FullName, 255).not_null())
                    .col(
                        timestamp_with_time_zone(CareRecipient::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CareRecipient::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_care_recipients_user_id")
                            .from(CareRecipient::Table, CareRecipient::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_care_recipients_user_id")
                    .table(CareRecipient::Table)
                    .col(CareRecipient::UserId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create notes table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Note::Table)
                    .if_not_exists()
                    .col(uuid(Note::Id).primary_key())
                    .col(uuid(Note::UserId).not_null())
                    .col(uuid(Note::AuthorId).not_null())
                    .col(uuid(Note::RecipientId).not_null())
                    .col(text(Note::Body).not_null())
                    .col(
                        timestamp_with_time_zone(Note::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notes_recipient_id")
                            .from(Note::Table, Note::RecipientId)
                            .to(CareRecipient::Table, CareRecipient::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notes_user_id")
                    .table(Note::Table)
                    .col(Note::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_notes_recipient_id")
                    .table(Note::Table)
                    .col(Note::RecipientId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Create client_access_tokens table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(ClientAccessToken::Table)
                    .if_not_exists()
                    .col(uuid(ClientAccessToken::Id).primary_key())
                    .col(
                        string_len(ClientAccessToken::Code, 16)
                            .not_null()
                            .unique_key(),
                    )
                    .col(uuid(ClientAccessToken::UserId).not_null())
                    .col(uuid(ClientAccessToken::RecipientId).not_null())
                    .col(
                        string_len(ClientAccessToken::AccessLevel, 32)
                            .not_null()
                            .default("read_summary"),
                    )
                    .col(
                        boolean(ClientAccessToken::IsActive)
                            .not_null()
                            .default(true),
                    )
                    .col(timestamp_with_time_zone_null(ClientAccessToken::ExpiresAt))
                    .col(timestamp_with_time_zone_null(ClientAccessToken::LastAccessedAt))
                    .col(
                        timestamp_with_time_zone(ClientAccessToken::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_access_tokens_user_id")
                            .from(ClientAccessToken::Table, ClientAccessToken::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_access_tokens_recipient_id")
                            .from(ClientAccessToken::Table, ClientAccessToken::RecipientId)
                            .to(CareRecipient::Table, CareRecipient::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_client_access_tokens_code")
                    .table(ClientAccessToken::Table)
                    .col(ClientAccessToken::Code)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_client_access_tokens_user_id")
                    .table(ClientAccessToken::Table)
                    .col(ClientAccessToken::UserId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Create admin_activity_logs table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(AdminActivityLog::Table)
                    .if_not_exists()
                    .col(uuid(AdminActivityLog::Id).primary_key())
                    .col(uuid(AdminActivityLog::AdminId).not_null())
                    .col(string_len(AdminActivityLog::Action, 64).not_null())
                    .col(string_len(AdminActivityLog::TargetType, 32).not_null())
                    .col(ColumnDef::new(AdminActivityLog::TargetId).uuid().null())
                    .col(json(AdminActivityLog::Details).not_null())
                    .col(
                        timestamp_with_time_zone(AdminActivityLog::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_activity_logs_admin_id")
                            .from(AdminActivityLog::Table, AdminActivityLog::AdminId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_admin_activity_logs_admin_id")
                    .table(AdminActivityLog::Table)
                    .col(AdminActivityLog::AdminId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_admin_activity_logs_created_at")
                    .table(AdminActivityLog::Table)
                    .col(AdminActivityLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order (respecting foreign keys)
        manager
            .drop_table(Table::drop().table(AdminActivityLog::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ClientAccessToken::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Note::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CareRecipient::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TeamMember::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

// ============================================================
// Table identifiers
// ============================================================

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    PasswordHash,
    DisplayName,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TeamMember {
    #[sea_orm(iden = "team_members")]
    Table,
    Id,
    OwnerId,
    MemberId,
    InvitedEmail,
    Role,
    Status,
    RecipientIds,
    InvitedAt,
    AcceptedAt,
    RemovedAt,
}

#[derive(DeriveIden)]
enum CareRecipient {
    #[sea_orm(iden = "care_recipients")]
    Table,
    Id,
    UserId,
    FullName,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Note {
    #[sea_orm(iden = "notes")]
    Table,
    Id,
    UserId,
    AuthorId,
    RecipientId,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ClientAccessToken {
    #[sea_orm(iden = "client_access_tokens")]
    Table,
    Id,
    Code,
    UserId,
    RecipientId,
    AccessLevel,
    IsActive,
    ExpiresAt,
    LastAccessedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AdminActivityLog {
    #[sea_orm(iden = "admin_activity_logs")]
    Table,
    Id,
    AdminId,
    Action,
    TargetType,
    TargetId,
    Details,
    CreatedAt,
}
