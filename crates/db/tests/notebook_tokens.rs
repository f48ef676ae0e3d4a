//! Integration tests for notebook, token and usage persistence.
//!
//! Exercises the repositories and `PgNotebookTokenStore` against a real
//! database, including the one-token-per-notebook constraint and cascades.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use mlcloud_core::access_token::hash_token;
use mlcloud_core::error::TokenError;
use mlcloud_core::notebook::{GpuType, NotebookStatus};
use mlcloud_core::token_service::{
    NotebookAccessTokenService, NotebookTokenStore, TokenSettings,
};
use mlcloud_db::models::notebook::{CreateNotebook, Notebook};
use mlcloud_db::repositories::{NotebookRepo, NotebookTokenRepo, UsageLogRepo};
use mlcloud_db::PgNotebookTokenStore;
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn settings() -> TokenSettings {
    TokenSettings::new("db-test-secret-0123456789abcdefghijklmn", Duration::hours(24)).unwrap()
}

fn service(pool: &PgPool) -> NotebookAccessTokenService<PgNotebookTokenStore> {
    NotebookAccessTokenService::new(PgNotebookTokenStore::new(pool.clone()), settings())
}

fn new_notebook(owner_id: Uuid, gpu_type: GpuType) -> CreateNotebook {
    CreateNotebook {
        owner_id,
        name: "training".to_string(),
        gpu_type,
        jupyter_port: 8890,
        jupyter_url: "https://jupyter-test.notebooks.localhost".to_string(),
    }
}

/// Create a notebook with a sealed token, returning the row and the plaintext.
async fn create_notebook(pool: &PgPool, owner_id: Uuid, gpu_type: GpuType) -> (Notebook, String) {
    let svc = service(pool);
    let sealed = svc.seal_new(owner_id, Utc::now()).unwrap();
    let notebook = NotebookRepo::create_with_token(pool, &new_notebook(owner_id, gpu_type), &sealed)
        .await
        .expect("notebook creation should succeed");
    (notebook, sealed.plaintext.expose().to_string())
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_writes_notebook_token_and_usage(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, plaintext) = create_notebook(&pool, owner, GpuType::V100).await;

    assert_eq!(notebook.owner_id, owner);
    assert_eq!(notebook.status().unwrap(), NotebookStatus::Creating);
    assert_eq!(notebook.gpu_type, "V100");

    let token = NotebookTokenRepo::find_by_notebook(&pool, notebook.id)
        .await
        .unwrap()
        .expect("token row must exist");
    assert_eq!(token.token_hash, hash_token(&plaintext));
    assert!(!token.encrypted_token.contains(&plaintext));
    assert!(token.expires_at > Utc::now() + Duration::hours(23));

    let logs = UsageLogRepo::list_for_owner(&pool, owner, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].resource_id, notebook.id);
    assert_eq!(logs[0].cost_amount, 0.5);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_token_is_a_conflict(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, _) = create_notebook(&pool, owner, GpuType::T4).await;

    let svc = service(&pool);
    let sealed = svc.seal_new(owner, Utc::now()).unwrap();
    let store = PgNotebookTokenStore::new(pool.clone());

    assert_matches!(
        store.create_token(&sealed.record(notebook.id, owner)).await,
        Err(TokenError::Conflict(id)) if id == notebook.id
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn token_for_missing_notebook_is_not_found(pool: PgPool) {
    let owner = Uuid::new_v4();
    let missing = Uuid::new_v4();
    let sealed = service(&pool).seal_new(owner, Utc::now()).unwrap();
    let store = PgNotebookTokenStore::new(pool.clone());

    assert_matches!(
        store.create_token(&sealed.record(missing, owner)).await,
        Err(TokenError::NotFound(id)) if id == missing
    );
}

// ---------------------------------------------------------------------------
// Token lifecycle through the service
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn resolve_returns_token_from_creation(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, plaintext) = create_notebook(&pool, owner, GpuType::T4).await;

    let issued = service(&pool).resolve(notebook.id, owner).await.unwrap();
    assert_eq!(issued.token.expose(), plaintext);
    assert!(!issued.minted);
}

#[sqlx::test(migrations = "./migrations")]
async fn resolve_for_other_owner_is_not_found(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, _) = create_notebook(&pool, owner, GpuType::T4).await;

    assert_matches!(
        service(&pool).resolve(notebook.id, Uuid::new_v4()).await,
        Err(TokenError::NotFound(_))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn purge_then_resolve_remints(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, plaintext) = create_notebook(&pool, owner, GpuType::T4).await;
    let svc = service(&pool);

    let later = Utc::now() + Duration::hours(25);
    assert_eq!(svc.purge_expired(later).await.unwrap(), 1);
    assert!(NotebookTokenRepo::find_by_notebook(&pool, notebook.id)
        .await
        .unwrap()
        .is_none());

    let issued = svc.resolve(notebook.id, owner).await.unwrap();
    assert!(issued.minted);
    assert_ne!(issued.token.expose(), plaintext);

    // A second resolve finds the lazily minted row.
    let again = svc.resolve(notebook.id, owner).await.unwrap();
    assert_eq!(again.token, issued.token);
}

#[sqlx::test(migrations = "./migrations")]
async fn expired_token_is_superseded_in_place(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, plaintext) = create_notebook(&pool, owner, GpuType::T4).await;
    let svc = service(&pool);

    let later = Utc::now() + Duration::hours(30);
    let issued = svc.resolve_at(notebook.id, owner, later).await.unwrap();

    assert!(issued.minted);
    assert_ne!(issued.token.expose(), plaintext);
    assert_eq!(issued.expires_at, later + Duration::hours(24));
}

// ---------------------------------------------------------------------------
// Deletion and status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn deleting_notebook_cascades_token(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, _) = create_notebook(&pool, owner, GpuType::T4).await;

    assert!(!NotebookRepo::delete_owned(&pool, notebook.id, Uuid::new_v4())
        .await
        .unwrap());
    assert!(NotebookRepo::delete_owned(&pool, notebook.id, owner).await.unwrap());

    assert!(NotebookTokenRepo::find_by_notebook(&pool, notebook.id)
        .await
        .unwrap()
        .is_none());
    // Usage history survives the notebook.
    assert_eq!(UsageLogRepo::list_for_owner(&pool, owner, 10).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn transition_requires_expected_status(pool: PgPool) {
    let owner = Uuid::new_v4();
    let (notebook, _) = create_notebook(&pool, owner, GpuType::A100).await;

    let stale = NotebookRepo::transition_status(
        &pool,
        notebook.id,
        owner,
        NotebookStatus::Running,
        NotebookStatus::Stopping,
        None,
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    let running = NotebookRepo::transition_status(
        &pool,
        notebook.id,
        owner,
        NotebookStatus::Creating,
        NotebookStatus::Running,
        Some("container-1"),
    )
    .await
    .unwrap()
    .expect("transition from creating should apply");
    assert_eq!(running.status, "running");
    assert_eq!(running.container_id.as_deref(), Some("container-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn usage_totals_group_by_resource_type(pool: PgPool) {
    let owner = Uuid::new_v4();
    create_notebook(&pool, owner, GpuType::V100).await;
    create_notebook(&pool, owner, GpuType::A100).await;
    create_notebook(&pool, Uuid::new_v4(), GpuType::A100).await;

    let totals = UsageLogRepo::totals_for_owner(&pool, owner).await.unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].resource_type, "notebook");
    assert_eq!(totals[0].entries, 2);
    assert!((totals[0].cost_amount - 1.7).abs() < 1e-9);
}
