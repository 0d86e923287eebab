//! Notes with dual attribution
//!
//! The one domain write path kept inside this core. It exists to enforce
//! and demonstrate the attribution invariant: every created row is filed
//! under the workspace owner (`user_id = attribution_id`) while authorship
//! stays with the acting principal (`author_id = principal.id`).

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use carebridge_auth::{Capability, PermissionSet, Principal};
use carebridge_db::entities::{care_recipient, note, prelude::*};

use crate::error::{AccessError, AccessResult};
use crate::workspace::WorkspaceContext;

#[derive(Clone)]
pub struct NoteService {
    db: DatabaseConnection,
}

impl NoteService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a note about a recipient in the caller's workspace.
    pub async fn create(
        &self,
        principal: &Principal,
        ctx: &WorkspaceContext,
        recipient_id: Uuid,
        body: String,
    ) -> AccessResult<note::Model> {
        if !PermissionSet::resolve(principal.role).allows(Capability::EditRecords) {
            return Err(AccessError::PermissionDenied(Capability::EditRecords));
        }

        let recipient = CareRecipient::find_by_id(recipient_id)
            .filter(care_recipient::Column::UserId.eq(ctx.attribution_id))
            .one(&self.db)
            .await?;

        if recipient.is_none() || !ctx.can_access_recipient(recipient_id) {
            return Err(AccessError::Validation(
                "Recipient does not belong to the caller's workspace".to_string(),
            ));
        }

        if body.trim().is_empty() {
            return Err(AccessError::Validation("Note body is empty".to_string()));
        }

        let note = note::ActiveModel {
            id: Set(Uuid::new_v4()),
            // Attribution: filed under the workspace owner, never the actor.
            user_id: Set(ctx.attribution_id),
            // Authorship: always the acting principal.
            author_id: Set(principal.id),
            recipient_id: Set(recipient_id),
            body: Set(body),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        debug!(
            note_id = %note.id,
            attribution = %note.user_id,
            author = %note.author_id,
            "Created note"
        );

        Ok(note)
    }

    /// Notes of the caller's workspace, newest first, limited to the
    /// caller's assigned recipients.
    pub async fn list(&self, ctx: &WorkspaceContext) -> AccessResult<Vec<note::Model>> {
        let mut query = Note::find().filter(note::Column::UserId.eq(ctx.attribution_id));

        if let Some(ref ids) = ctx.assigned_recipient_ids {
            query = query.filter(note::Column::RecipientId.is_in(ids.iter().copied()));
        }

        let notes = query
            .order_by_desc(note::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(notes)
    }
}
