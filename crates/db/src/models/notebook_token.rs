//! Notebook access token row.

use mlcloud_core::token_service::StoredTokenRecord;
use mlcloud_core::types::{DbId, NotebookId, OwnerId, Timestamp};
use sqlx::FromRow;

/// A row from the `notebook_tokens` table.
///
/// Deliberately not `Serialize`: neither the envelope nor the hash is ever
/// sent to clients.
#[derive(Debug, Clone, FromRow)]
pub struct NotebookToken {
    pub id: DbId,
    pub notebook_id: NotebookId,
    pub owner_id: OwnerId,
    pub encrypted_token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

impl From<NotebookToken> for StoredTokenRecord {
    fn from(row: NotebookToken) -> Self {
        Self {
            encrypted_token: row.encrypted_token,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
        }
    }
}
