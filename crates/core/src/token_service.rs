//! Notebook access token lifecycle: mint, resolve (with lazy mint) and purge.
//!
//! Persistence is abstracted behind [`NotebookTokenStore`] so the lifecycle
//! rules live here while the PostgreSQL adapter lives in the db crate.
//!
//! Per notebook the token is either absent or minted. `resolve` repairs
//! absence by minting, supersedes expired rows, and never hides a
//! decryption failure behind a remint.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;

use crate::access_token::{self, OwnerKey, PlaintextToken, MIN_SECRET_LEN};
use crate::error::{CoreError, TokenError};
use crate::types::{DbId, NotebookId, OwnerId, Timestamp};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Row to insert for a freshly minted token.
#[derive(Debug, Clone)]
pub struct NewTokenRecord {
    pub notebook_id: NotebookId,
    pub owner_id: OwnerId,
    pub encrypted_token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}

/// Stored token fields needed to hand the token back.
#[derive(Debug, Clone)]
pub struct StoredTokenRecord {
    pub encrypted_token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}

/// Persistence required by [`NotebookAccessTokenService`].
///
/// Implementations must enforce at most one row per notebook and report a
/// losing concurrent insert as [`TokenError::Conflict`].
pub trait NotebookTokenStore: Send + Sync {
    /// Whether `notebook_id` exists and belongs to `owner_id`.
    fn notebook_owned_by(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
    ) -> impl Future<Output = Result<bool, TokenError>> + Send;

    /// Insert a token row, returning its surrogate id.
    fn create_token(
        &self,
        record: &NewTokenRecord,
    ) -> impl Future<Output = Result<DbId, TokenError>> + Send;

    /// Fetch the token row for a notebook, if any.
    fn get_token(
        &self,
        notebook_id: NotebookId,
    ) -> impl Future<Output = Result<Option<StoredTokenRecord>, TokenError>> + Send;

    /// Delete the notebook's token row if it expired at or before `now`.
    fn delete_expired_token(
        &self,
        notebook_id: NotebookId,
        now: Timestamp,
    ) -> impl Future<Output = Result<bool, TokenError>> + Send;

    /// Delete every row that expired at or before `now`; returns the count.
    fn purge_expired(&self, now: Timestamp)
        -> impl Future<Output = Result<u64, TokenError>> + Send;
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Server-side key material and token lifetime. Cheap to clone.
#[derive(Clone)]
pub struct TokenSettings {
    secret: Arc<[u8]>,
    ttl: chrono::Duration,
}

impl TokenSettings {
    /// Build settings, rejecting short secrets and lifetimes outside
    /// `(0, MAX_TOKEN_TTL_HOURS]`.
    pub fn new(secret: impl AsRef<[u8]>, ttl: chrono::Duration) -> Result<Self, CoreError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(CoreError::Validation(format!(
                "token encryption secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        if ttl <= chrono::Duration::zero() {
            return Err(CoreError::Validation(
                "token lifetime must be positive".into(),
            ));
        }
        if ttl > chrono::Duration::hours(MAX_TOKEN_TTL_HOURS) {
            return Err(CoreError::Validation(format!(
                "token lifetime must be at most {MAX_TOKEN_TTL_HOURS} hours"
            )));
        }
        Ok(Self {
            secret: Arc::from(secret),
            ttl,
        })
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    fn owner_key(&self, owner_id: OwnerId) -> OwnerKey {
        OwnerKey::derive(&self.secret, owner_id)
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tokens handed to callers
// ---------------------------------------------------------------------------

/// A token sealed for storage but not yet written anywhere.
#[derive(Debug)]
pub struct SealedToken {
    pub plaintext: PlaintextToken,
    pub encrypted_token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}

impl SealedToken {
    /// The row to persist for `notebook_id`.
    pub fn record(&self, notebook_id: NotebookId, owner_id: OwnerId) -> NewTokenRecord {
        NewTokenRecord {
            notebook_id,
            owner_id,
            encrypted_token: self.encrypted_token.clone(),
            token_hash: self.token_hash.clone(),
            expires_at: self.expires_at,
        }
    }

    /// Consume into the caller-facing token after the row has been persisted.
    pub fn into_issued(self) -> IssuedToken {
        IssuedToken {
            token: self.plaintext,
            expires_at: self.expires_at,
            minted: true,
        }
    }
}

/// A plaintext token ready to be embedded in an access URL.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: PlaintextToken,
    pub expires_at: Timestamp,
    /// `true` when this call created the stored row.
    pub minted: bool,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Mints, stores and recovers notebook access tokens.
pub struct NotebookAccessTokenService<S> {
    store: S,
    settings: TokenSettings,
}

impl<S: NotebookTokenStore> NotebookAccessTokenService<S> {
    pub fn new(store: S, settings: TokenSettings) -> Self {
        Self { store, settings }
    }

    /// Generate, encrypt and hash a new token for `owner_id` without storing it.
    ///
    /// Lets notebook creation write the token row in its own transaction.
    pub fn seal_new(&self, owner_id: OwnerId, now: Timestamp) -> Result<SealedToken, TokenError> {
        let plaintext = PlaintextToken::generate();
        let encrypted_token = access_token::seal(&self.settings.owner_key(owner_id), &plaintext)?;
        let token_hash = plaintext.hash();

        Ok(SealedToken {
            plaintext,
            encrypted_token,
            token_hash,
            expires_at: now + self.settings.ttl,
        })
    }

    /// Mint and store a token for a notebook.
    pub async fn mint(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
    ) -> Result<IssuedToken, TokenError> {
        self.mint_at(notebook_id, owner_id, Utc::now()).await
    }

    /// [`mint`](Self::mint) with an explicit clock.
    pub async fn mint_at(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
        now: Timestamp,
    ) -> Result<IssuedToken, TokenError> {
        let sealed = self.seal_new(owner_id, now)?;
        let row_id = self
            .store
            .create_token(&sealed.record(notebook_id, owner_id))
            .await?;

        tracing::info!(
            %notebook_id,
            %owner_id,
            token_row_id = row_id,
            expires_at = %sealed.expires_at,
            "Minted notebook access token"
        );
        Ok(sealed.into_issued())
    }

    /// Return the notebook's token, minting one if none is stored.
    pub async fn resolve(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
    ) -> Result<IssuedToken, TokenError> {
        self.resolve_at(notebook_id, owner_id, Utc::now()).await
    }

    /// [`resolve`](Self::resolve) with an explicit clock.
    pub async fn resolve_at(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
        now: Timestamp,
    ) -> Result<IssuedToken, TokenError> {
        if !self.store.notebook_owned_by(notebook_id, owner_id).await? {
            return Err(TokenError::NotFound(notebook_id));
        }

        match self.store.get_token(notebook_id).await? {
            None => {
                tracing::debug!(%notebook_id, "No stored access token, minting lazily");
                self.mint_or_adopt(notebook_id, owner_id, now).await
            }
            Some(record) if record.expires_at <= now => {
                tracing::info!(
                    %notebook_id,
                    expired_at = %record.expires_at,
                    "Superseding expired notebook access token"
                );
                self.store.delete_expired_token(notebook_id, now).await?;
                self.mint_or_adopt(notebook_id, owner_id, now).await
            }
            Some(record) => self.open_record(notebook_id, owner_id, &record),
        }
    }

    /// Delete all expired token rows.
    pub async fn purge_expired(&self, now: Timestamp) -> Result<u64, TokenError> {
        self.store.purge_expired(now).await
    }

    /// Mint, or if a concurrent request won the insert, decrypt its row.
    async fn mint_or_adopt(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
        now: Timestamp,
    ) -> Result<IssuedToken, TokenError> {
        match self.mint_at(notebook_id, owner_id, now).await {
            Err(TokenError::Conflict(_)) => {
                tracing::debug!(%notebook_id, "Lost lazy mint race, reading winner's token");
                let record = self.store.get_token(notebook_id).await?.ok_or_else(|| {
                    TokenError::Storage("token row disappeared after a conflicting insert".into())
                })?;
                self.open_record(notebook_id, owner_id, &record)
            }
            other => other,
        }
    }

    fn open_record(
        &self,
        notebook_id: NotebookId,
        owner_id: OwnerId,
        record: &StoredTokenRecord,
    ) -> Result<IssuedToken, TokenError> {
        let opened = access_token::open(&self.settings.owner_key(owner_id), &record.encrypted_token)
            .and_then(|token| {
                if token.hash() == record.token_hash {
                    Ok(token)
                } else {
                    Err(TokenError::Decryption("token hash mismatch"))
                }
            });

        match opened {
            Ok(token) => Ok(IssuedToken {
                token,
                expires_at: record.expires_at,
                minted: false,
            }),
            Err(e) => {
                tracing::warn!(
                    target: "security",
                    %notebook_id,
                    %owner_id,
                    error = %e,
                    "Notebook access token failed verification"
                );
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
