//! PostgreSQL implementation of [`NotebookTokenStore`].

use mlcloud_core::error::TokenError;
use mlcloud_core::token_service::{NewTokenRecord, NotebookTokenStore, StoredTokenRecord};
use mlcloud_core::types::{DbId, NotebookId, OwnerId, Timestamp};
use sqlx::PgPool;

use crate::repositories::notebook_token_repo::UNIQUE_NOTEBOOK_CONSTRAINT;
use crate::repositories::{NotebookRepo, NotebookTokenRepo};

/// PostgreSQL unique violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL foreign key violation SQLSTATE.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Token store backed by the `notebooks` and `notebook_tokens` tables.
#[derive(Clone)]
pub struct PgNotebookTokenStore {
    pool: PgPool,
}

impl PgNotebookTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl NotebookTokenStore for PgNotebookTokenStore {
    async fn notebook_owned_by(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
    ) -> Result<bool, TokenError> {
        NotebookRepo::is_owned_by(&self.pool, notebook_id, owner_id)
            .await
            .map_err(storage_error)
    }

    async fn create_token(&self, record: &NewTokenRecord) -> Result<DbId, TokenError> {
        NotebookTokenRepo::create(&self.pool, record)
            .await
            .map_err(|e| classify_insert_error(e, record.notebook_id))
    }

    async fn get_token(
        &self,
        notebook_id: NotebookId,
    ) -> Result<Option<StoredTokenRecord>, TokenError> {
        NotebookTokenRepo::find_by_notebook(&self.pool, notebook_id)
            .await
            .map(|row| row.map(StoredTokenRecord::from))
            .map_err(storage_error)
    }

    async fn delete_expired_token(
        &self,
        notebook_id: NotebookId,
        now: Timestamp,
    ) -> Result<bool, TokenError> {
        NotebookTokenRepo::delete_expired_for_notebook(&self.pool, notebook_id, now)
            .await
            .map_err(storage_error)
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, TokenError> {
        NotebookTokenRepo::delete_expired(&self.pool, now)
            .await
            .map_err(storage_error)
    }
}

/// Map an insert failure: the one-token-per-notebook violation is a conflict
/// and a missing parent notebook (deleted concurrently) is not found.
pub fn classify_insert_error(err: sqlx::Error, notebook_id: NotebookId) -> TokenError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) if db_err.constraint() == Some(UNIQUE_NOTEBOOK_CONSTRAINT) => {
                return TokenError::Conflict(notebook_id);
            }
            Some(FOREIGN_KEY_VIOLATION) => return TokenError::NotFound(notebook_id),
            _ => {}
        }
    }
    storage_error(err)
}

fn storage_error(err: sqlx::Error) -> TokenError {
    tracing::error!(error = %err, "Notebook token store failure");
    TokenError::Storage(err.to_string())
}
