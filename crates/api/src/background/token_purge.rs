//! Periodic sweep of expired notebook access tokens.
//!
//! Deletes `notebook_tokens` rows whose `expires_at` has passed. A notebook
//! whose token was swept gets a fresh one on its next access URL request.

use std::time::Duration;

use chrono::Utc;
use mlcloud_core::token_service::{NotebookAccessTokenService, NotebookTokenStore};
use tokio_util::sync::CancellationToken;

/// Run the purge loop until `cancel` is triggered.
///
/// The first sweep runs immediately.
pub async fn run<S: NotebookTokenStore>(
    service: NotebookAccessTokenService<S>,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), "Token purge job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token purge job stopping");
                break;
            }
            _ = interval.tick() => {
                match service.purge_expired(Utc::now()).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Token purge: removed expired tokens");
                    }
                    Ok(_) => tracing::debug!("Token purge: nothing to remove"),
                    Err(e) => tracing::error!(error = %e, "Token purge: sweep failed"),
                }
            }
        }
    }
}
