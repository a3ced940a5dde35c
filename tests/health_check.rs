mod common;

use serde_json::Value;
use sqlx::PgPool;

use common::spawn_app;

#[sqlx::test]
async fn health_check_reports_database(pool: PgPool) {
    let (address, _) = spawn_app(pool).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{address}/api/health/"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["db"], "ok");
}

#[sqlx::test]
async fn health_check_is_unavailable_without_database(pool: PgPool) {
    let (address, _) = spawn_app(pool.clone()).await;
    pool.close().await;

    let response = reqwest::Client::new()
        .get(format!("{address}/api/health/"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["db"], "unreachable");
}
