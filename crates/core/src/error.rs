use crate::types::NotebookId;

/// Domain errors shared by every crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

/// Failures of the notebook access token lifecycle.
///
/// None of the variants carry plaintext token material.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The notebook does not exist or belongs to someone else.
    #[error("Notebook {0} not found")]
    NotFound(NotebookId),

    /// Another request stored a token for this notebook first.
    #[error("A token already exists for notebook {0}")]
    Conflict(NotebookId),

    /// The cipher refused to encrypt the token.
    #[error("Token encryption failed")]
    Encryption,

    /// The stored envelope failed framing or authentication under the derived key.
    #[error("Stored access token could not be decrypted: {0}")]
    Decryption(&'static str),

    /// The backing store is unavailable or rejected the operation.
    #[error("Token storage failure: {0}")]
    Storage(String),
}
