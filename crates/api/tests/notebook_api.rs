//! HTTP-level integration tests for notebooks, access URLs and usage.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, post_auth, post_json, post_json_auth, put_json_auth,
};
use mlcloud_core::access_token::hash_token;
use mlcloud_db::repositories::NotebookTokenRepo;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a notebook through the API and return the `data` payload.
async fn create_notebook(pool: &PgPool, owner: Uuid, gpu_type: &str) -> Value {
    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/notebooks",
        json!({ "name": "experiment", "gpu_type": gpu_type }),
        owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

fn notebook_id(created: &Value) -> String {
    created["notebook"]["id"].as_str().unwrap().to_string()
}

fn timestamp(value: &Value) -> chrono::DateTime<chrono::Utc> {
    value.as_str().unwrap().parse().unwrap()
}

fn token_of(url: &str) -> &str {
    url.split_once("?token=").expect("access URL carries a token").1
}

async fn request_access_url(pool: &PgPool, owner: Uuid, id: &str) -> axum::response::Response {
    let app = common::build_test_app(pool.clone());
    post_json_auth(
        app,
        "/api/v1/notebooks/access-url",
        json!({ "notebookId": id }),
        owner,
    )
    .await
}

async fn set_status(pool: &PgPool, owner: Uuid, id: &str, status: &str) -> axum::response::Response {
    let app = common::build_test_app(pool.clone());
    put_json_auth(
        app,
        &format!("/api/v1/notebooks/{id}/status"),
        json!({ "status": status, "container_id": "ctr-1" }),
        owner,
    )
    .await
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_returns_notebook_with_one_time_access_url(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = create_notebook(&pool, owner, "v100").await;

    let notebook = &created["notebook"];
    assert_eq!(notebook["status"], "creating");
    assert_eq!(notebook["gpu_type"], "V100");
    let port = notebook["jupyter_port"].as_i64().unwrap();
    assert!((8888..9888).contains(&port));

    let url = created["access_url"].as_str().unwrap();
    let prefix = &owner.simple().to_string()[..8];
    assert!(url.starts_with(&format!("https://jupyter-{prefix}.notebooks.test?token=")));

    // Only the hash and the envelope are stored.
    let id: Uuid = notebook_id(&created).parse().unwrap();
    let row = NotebookTokenRepo::find_by_notebook(&pool, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.token_hash, hash_token(token_of(url)));
    assert!(!row.encrypted_token.contains(token_of(url)));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_rejects_unknown_gpu_and_blank_name(pool: PgPool) {
    let owner = Uuid::new_v4();

    let app = common::build_test_app(pool.clone());
    let response = post_json_auth(
        app,
        "/api/v1/notebooks",
        json!({ "name": "x", "gpu_type": "H100" }),
        owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let app = common::build_test_app(pool);
    let response = post_json_auth(
        app,
        "/api/v1/notebooks",
        json!({ "name": "  ", "gpu_type": "T4" }),
        owner,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn requests_without_bearer_token_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/notebooks/access-url",
        json!({ "notebookId": Uuid::new_v4().to_string() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// Access URL
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn access_url_returns_token_issued_at_creation(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = create_notebook(&pool, owner, "T4").await;
    let id = notebook_id(&created);

    let response = request_access_url(&pool, owner, &id).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["accessUrl"], created["access_url"]);
    assert_eq!(json["port"], created["notebook"]["jupyter_port"]);

    // Storage keeps microseconds; the creation response has the full clock.
    let stored = timestamp(&json["expiresAt"]);
    let issued = timestamp(&created["token_expires_at"]);
    assert!((stored - issued).num_milliseconds().abs() < 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn access_url_for_other_owner_is_not_found(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = create_notebook(&pool, owner, "T4").await;

    let response = request_access_url(&pool, Uuid::new_v4(), &notebook_id(&created)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
    assert!(json.get("accessUrl").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn access_url_with_malformed_id_is_not_found(pool: PgPool) {
    let response = request_access_url(&pool, Uuid::new_v4(), "not-a-uuid").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn access_url_with_malformed_body_returns_json_error(pool: PgPool) {
    let owner = Uuid::new_v4();

    for body in [json!({}), json!({ "notebookId": 5 })] {
        let app = common::build_test_app(pool.clone());
        let response = post_json_auth(app, "/api/v1/notebooks/access-url", body, owner).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
        assert_eq!(json["code"], "BAD_REQUEST");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn access_url_remints_after_token_is_purged(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = create_notebook(&pool, owner, "T4").await;
    let id = notebook_id(&created);

    let later = chrono::Utc::now() + chrono::Duration::hours(25);
    assert_eq!(NotebookTokenRepo::delete_expired(&pool, later).await.unwrap(), 1);

    let first = body_json(request_access_url(&pool, owner, &id).await).await;
    assert_ne!(first["accessUrl"], created["access_url"]);

    // The lazily minted token is stable across requests.
    let second = body_json(request_access_url(&pool, owner, &id).await).await;
    assert_eq!(second["accessUrl"], first["accessUrl"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn corrupted_token_is_access_denied(pool: PgPool) {
    let owner = Uuid::new_v4();
    let created = create_notebook(&pool, owner, "T4").await;
    let id = notebook_id(&created);

    sqlx::query("UPDATE notebook_tokens SET encrypted_token = 'garbage' WHERE notebook_id = $1")
        .bind(id.parse::<Uuid>().unwrap())
        .execute(&pool)
        .await
        .unwrap();

    let response = request_access_url(&pool, owner, &id).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "ACCESS_DENIED");
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn lifecycle_follows_runtime_reports(pool: PgPool) {
    let owner = Uuid::new_v4();
    let id = notebook_id(&create_notebook(&pool, owner, "A100").await);

    // Nothing to start while provisioning.
    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/notebooks/{id}/start"), owner).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = set_status(&pool, owner, &id, "running").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["container_id"], "ctr-1");

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/notebooks/{id}/start"), owner).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Notebook is already running");

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/notebooks/{id}/stop"), owner).await;
    assert_eq!(body_json(response).await["data"]["status"], "stopping");

    // Stopping only completes as stopped or failed.
    let response = set_status(&pool, owner, &id, "running").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = set_status(&pool, owner, &id, "stopped").await;
    assert_eq!(body_json(response).await["data"]["status"], "stopped");

    let app = common::build_test_app(pool.clone());
    let response = post_auth(app, &format!("/api/v1/notebooks/{id}/start"), owner).await;
    assert_eq!(body_json(response).await["data"]["status"], "starting");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn list_and_get_are_scoped_to_owner(pool: PgPool) {
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    let id = notebook_id(&create_notebook(&pool, owner, "T4").await);
    create_notebook(&pool, other, "T4").await;

    let app = common::build_test_app(pool.clone());
    let json = body_json(get_auth(app, "/api/v1/notebooks", owner).await).await;
    let listed = json["data"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let app = common::build_test_app(pool.clone());
    let response = get_auth(app, &format!("/api/v1/notebooks/{id}"), other).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn delete_removes_notebook_and_its_token(pool: PgPool) {
    let owner = Uuid::new_v4();
    let id = notebook_id(&create_notebook(&pool, owner, "T4").await);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/notebooks/{id}"), Uuid::new_v4()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = common::build_test_app(pool.clone());
    let response = delete_auth(app, &format!("/api/v1/notebooks/{id}"), owner).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = request_access_url(&pool, owner, &id).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(NotebookTokenRepo::find_by_notebook(&pool, id.parse().unwrap())
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn usage_reports_cost_per_gpu_type(pool: PgPool) {
    let owner = Uuid::new_v4();
    create_notebook(&pool, owner, "V100").await;
    create_notebook(&pool, owner, "A100").await;

    let app = common::build_test_app(pool);
    let json = body_json(get_auth(app, "/api/v1/usage", owner).await).await;

    let totals = json["data"]["totals"].as_array().unwrap();
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0]["resource_type"], "notebook");
    assert_eq!(totals[0]["entries"], 2);
    let cost = totals[0]["cost_amount"].as_f64().unwrap();
    assert!((cost - 1.7).abs() < 1e-9);
    assert_eq!(json["data"]["recent"].as_array().unwrap().len(), 2);
}
