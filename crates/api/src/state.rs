use std::sync::Arc;

use mlcloud_core::token_service::{NotebookAccessTokenService, TokenSettings};
use mlcloud_db::PgNotebookTokenStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mlcloud_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Validated key material and lifetime for notebook access tokens.
    pub token_settings: TokenSettings,
}

impl AppState {
    /// Token service over this state's pool.
    pub fn token_service(&self) -> NotebookAccessTokenService<PgNotebookTokenStore> {
        NotebookAccessTokenService::new(
            PgNotebookTokenStore::new(self.pool.clone()),
            self.token_settings.clone(),
        )
    }
}
