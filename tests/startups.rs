mod common;

use serde_json::Value;
use sqlx::PgPool;

use fundbridge::models::SavedStartup;

use common::{
    investor_id_for, investor_payload, register, spawn_app, startup_id_for, startup_payload,
};

async fn save(pool: &PgPool, investor_email: &str, startup_id: i64) {
    let investor_id = investor_id_for(pool, investor_email).await;
    let saved = SavedStartup::save(pool, investor_id, startup_id, "promising")
        .await
        .unwrap();
    assert_eq!(saved.startup_id, startup_id);
}

#[sqlx::test]
async fn public_profile_has_tags_logo_and_followers(pool: PgPool) {
    let (address, _) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    register(&client, &address, &startup_payload("s@example.com")).await;
    register(&client, &address, &investor_payload("vc1@example.com")).await;
    register(&client, &address, &investor_payload("vc2@example.com")).await;

    let startup_id = startup_id_for(&pool, "s@example.com").await;
    sqlx::query(
        "UPDATE startup_profiles SET partners_brands = 'Brand A, Brand B,, ', logo = 'logos/acme.png' WHERE id = $1",
    )
    .bind(startup_id)
    .execute(&pool)
    .await
    .unwrap();
    save(&pool, "vc1@example.com", startup_id).await;
    save(&pool, "vc2@example.com", startup_id).await;
    // saving again only replaces the notes
    save(&pool, "vc2@example.com", startup_id).await;

    let response = client
        .get(format!("{address}/api/startups/{startup_id}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["company_name"], "Acme Robotics");
    assert_eq!(body["tags"], serde_json::json!(["Brand A", "Brand B"]));
    assert_eq!(body["followers_count"], 2);
    assert_eq!(body["founded_year"], 2021);
    let logo_url = body["logo_url"].as_str().unwrap();
    assert!(logo_url.starts_with("http://127.0.0.1:"), "{logo_url}");
    assert!(logo_url.ends_with("/media/logos/acme.png"), "{logo_url}");
}

#[sqlx::test]
async fn profile_without_logo_or_followers(pool: PgPool) {
    let (address, _) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();
    register(&client, &address, &startup_payload("s@example.com")).await;
    let startup_id = startup_id_for(&pool, "s@example.com").await;

    let body: Value = client
        .get(format!("{address}/api/startups/{startup_id}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["logo_url"].is_null());
    assert_eq!(body["tags"], serde_json::json!([]));
    assert_eq!(body["followers_count"], 0);
}

#[sqlx::test]
async fn unknown_startup_is_not_found(pool: PgPool) {
    let (address, _) = spawn_app(pool).await;
    let client = reqwest::Client::new();

    for path in ["999999", "abc"] {
        let response = client
            .get(format!("{address}/api/startups/{path}/"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
