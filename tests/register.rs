mod common;

use serde_json::{Value, json};
use fundbridge::models::{InvestorProfile, Region, Role, User};
use sqlx::PgPool;

use common::{investor_payload, register, spawn_app, startup_payload};

#[sqlx::test]
async fn register_startup_creates_inactive_user_and_profile(pool: PgPool) {
    let (address, mock_emailer) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    let response = register(&client, &address, &startup_payload("Founder@Example.com")).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "founder@example.com");
    assert_eq!(body["detail"], "Verification email sent.");

    let (is_active, company, profile_email): (bool, String, String) = sqlx::query_as(
        r#"
        SELECT u.is_active, s.company_name, s.email
        FROM users u JOIN startup_profiles s ON s.user_id = u.id
        WHERE u.email = 'founder@example.com'
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(!is_active);
    assert_eq!(company, "Acme Robotics");
    assert_eq!(profile_email, "founder@example.com");

    let sent = mock_emailer.last_sent_to("founder@example.com").unwrap();
    assert_eq!(sent.subject, "Verify your email");
    assert!(sent.body_html.contains("/api/auth/verify/"));
}

#[sqlx::test]
async fn register_investor_creates_profile(pool: PgPool) {
    let (address, _) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    let response = register(&client, &address, &investor_payload("vc@example.com")).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let user = User::find_by_email(&pool, "vc@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.role(&pool).await.unwrap(), Some(Role::Investor));

    let investor = InvestorProfile::find_by_user(&pool, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(investor.full_name, "Jane Roe");
    assert_eq!(investor.region, Region::Lviv);
    assert_eq!(investor.email, "vc@example.com");
    assert_eq!(investor.investment_range_min.to_string(), "10000.00");

    let startups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM startup_profiles")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(startups, 0);
}

#[sqlx::test]
async fn duplicate_email_looks_like_success_but_writes_nothing(pool: PgPool) {
    let (address, mock_emailer) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    let first = register(&client, &address, &startup_payload("dup@example.com")).await;
    assert_eq!(first.status(), reqwest::StatusCode::CREATED);
    let first: Value = first.json().await.unwrap();
    assert_eq!(mock_emailer.sent_count(), 1);

    let second = register(&client, &address, &investor_payload("DUP@example.com")).await;
    assert_eq!(second.status(), reqwest::StatusCode::CREATED);
    let second: Value = second.json().await.unwrap();
    assert_eq!(second["detail"], first["detail"]);
    assert_eq!(second["email"], "dup@example.com");
    assert_ne!(second["id"], first["id"]);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'dup@example.com'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
    let investors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investor_profiles")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(investors, 0);
    assert_eq!(mock_emailer.sent_count(), 1);
}

#[sqlx::test]
async fn investor_range_must_be_ordered(pool: PgPool) {
    let (address, _) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    let mut payload = investor_payload("vc@example.com");
    payload["investment_range_min"] = json!("100.00");
    payload["investment_range_max"] = json!("50.00");

    let response = register(&client, &address, &payload).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["investment_range_max"].is_array());

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[sqlx::test]
async fn role_specific_fields_are_required(pool: PgPool) {
    let (address, _) = spawn_app(pool).await;
    let client = reqwest::Client::new();

    let mut startup = startup_payload("s@example.com");
    startup.as_object_mut().unwrap().remove("company_name");
    let response = register(&client, &address, &startup).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["company_name"].is_array());

    let mut investor = investor_payload("i@example.com");
    investor.as_object_mut().unwrap().remove("investment_range_min");
    investor.as_object_mut().unwrap().remove("investment_range_max");
    let response = register(&client, &address, &investor).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["investment_range_min"].is_array());

    let mut no_role = startup_payload("r@example.com");
    no_role.as_object_mut().unwrap().remove("role");
    let response = register(&client, &address, &no_role).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["role"].is_array());
}

#[sqlx::test]
async fn unknown_choices_are_reported_per_field(pool: PgPool) {
    let (address, mock_emailer) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    let mut payload = investor_payload("vc@example.com");
    payload["role"] = json!("admin");
    payload["region"] = json!("atlantis");
    payload["founded_year"] = json!("next year");

    let response = register(&client, &address, &payload).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], json!(["\"admin\" is not a valid choice."]));
    assert_eq!(body["region"], json!(["\"atlantis\" is not a valid choice."]));
    assert_eq!(body["founded_year"], json!(["A valid integer is required."]));
    assert!(body.get("detail").is_none(), "{body}");

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
    assert_eq!(mock_emailer.sent_count(), 0);
}

#[sqlx::test]
async fn oversized_investment_range_is_a_field_error(pool: PgPool) {
    let (address, _) = spawn_app(pool.clone()).await;
    let client = reqwest::Client::new();

    let mut payload = investor_payload("vc@example.com");
    payload["investment_range_min"] = json!("100000000000.00");
    payload["investment_range_max"] = json!("200000000000.00");

    let response = register(&client, &address, &payload).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["investment_range_min"],
        json!(["Ensure that there are no more than 10 digits before the decimal point."])
    );
    assert!(body["investment_range_max"].is_array());

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[sqlx::test]
async fn markup_in_first_name_is_escaped_in_the_mail(pool: PgPool) {
    let (address, mock_emailer) = spawn_app(pool).await;
    let client = reqwest::Client::new();

    let mut payload = startup_payload("victim@example.com");
    payload["first_name"] = json!(r#"<a href="https://evil.example/phish">Click here to verify</a>"#);

    let response = register(&client, &address, &payload).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let sent = mock_emailer.last_sent_to("victim@example.com").unwrap();
    assert!(!sent.body_html.contains(r#"<a href="https://evil"#), "{}", sent.body_html);
    assert!(sent.body_html.contains("&lt;a href="));
    assert_eq!(sent.body_html.matches("<a ").count(), 1);
    assert!(sent.body_html.contains("/api/auth/verify/"));
}

#[sqlx::test]
async fn field_errors_are_collected(pool: PgPool) {
    let (address, mock_emailer) = spawn_app(pool).await;
    let client = reqwest::Client::new();

    let response = register(
        &client,
        &address,
        &json!({
            "email": "invalid-email",
            "password": "123",
            "first_name": "",
            "last_name": "Doe",
            "role": "startup",
            "company_name": "Acme",
            "website": "invalid-url"
        }),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    for field in ["email", "password", "first_name", "website"] {
        assert!(body[field].is_array(), "missing error for {field}: {body}");
    }
    assert_eq!(mock_emailer.sent_count(), 0);
}

#[sqlx::test]
async fn malformed_body_is_bad_request(pool: PgPool) {
    let (address, _) = spawn_app(pool).await;

    let response = reqwest::Client::new()
        .post(format!("{address}/api/auth/register/"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
