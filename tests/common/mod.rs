#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use fundbridge::services::email::{EmailError, EmailService};
use reqwest::{Response, header::SET_COOKIE};
use serde_json::{Value, json};
use sqlx::PgPool;
use tokio::net::TcpListener;

pub const PASSWORD: &str = "SecurePass123!";

pub fn init_tracing_once() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("fundbridge=debug")
            .with_test_writer()
            .init();
    });
}

/// A mock email service that stores sent emails for testing purposes.
/// This is ideal for integration tests as it doesn't produce console output.
#[derive(Debug, Default)]
pub struct MockEmailer {
    sent_emails: Mutex<Vec<SentEmail>>,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body_html: String,
}

impl MockEmailer {
    pub fn new() -> Self {
        Self {
            sent_emails: Mutex::new(Vec::new()),
        }
    }

    /// Get all sent emails for testing verification
    pub fn get_sent_emails(&self) -> Vec<SentEmail> {
        self.sent_emails.lock().unwrap().clone()
    }

    /// Get the count of sent emails
    pub fn sent_count(&self) -> usize {
        self.sent_emails.lock().unwrap().len()
    }

    /// Get the last email sent to `recipient`
    pub fn last_sent_to(&self, recipient: &str) -> Option<SentEmail> {
        self.sent_emails
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|email| email.recipient == recipient)
            .cloned()
    }
}

#[async_trait]
impl EmailService for MockEmailer {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body_html: &str,
    ) -> Result<(), EmailError> {
        self.sent_emails.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body_html: body_html.to_string(),
        });
        Ok(())
    }
}

/// Spawns the application and returns its address and mock emailer for testing.
///
/// Returned address format: `http://127.0.0.1:8492`
pub async fn spawn_app(test_db_pool: PgPool) -> (String, Arc<MockEmailer>) {
    dotenvy::from_filename_override("tests/data/.test.env").unwrap();
    init_tracing_once();

    let mock_emailer = Arc::new(MockEmailer::new());
    let mock_cloned = Arc::clone(&mock_emailer);

    // Randomly choose an available port
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port at localhost");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let app = fundbridge::app_with_email_service(test_db_pool, mock_cloned);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let address = format!("http://127.0.0.1:{port}");

    // Wait for server to be ready
    let client = reqwest::Client::new();
    for _ in 0..10 {
        if client
            .get(format!("{address}/api/health/"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    (address, mock_emailer)
}

pub fn startup_payload(email: &str) -> Value {
    json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "John",
        "last_name": "Doe",
        "role": "startup",
        "company_name": "Acme Robotics",
        "description": "Warehouse automation",
        "website": "https://acme.example.com",
        "city": "Kyiv",
        "founded_year": 2021,
        "team_size": 12
    })
}

pub fn investor_payload(email: &str) -> Value {
    json!({
        "email": email,
        "password": PASSWORD,
        "first_name": "Jane",
        "last_name": "Roe",
        "role": "investor",
        "company_name": "Roe Capital",
        "investment_range_min": "10000.00",
        "investment_range_max": "50000.00",
        "region": "lviv"
    })
}

pub async fn register(client: &reqwest::Client, address: &str, payload: &Value) -> Response {
    client
        .post(format!("{address}/api/auth/register/"))
        .json(payload)
        .send()
        .await
        .expect("Failed to register")
}

/// Path of the verification link in a mail body, e.g. `/api/auth/verify/{uid}/{token}/`
pub fn extract_verification_path(email_body: &str) -> String {
    let start = email_body
        .find("/api/auth/verify/")
        .expect("No verification link in email");
    let rest = &email_body[start..];
    let end = rest.find('"').expect("Unterminated verification link");
    rest[..end].to_string()
}

/// Splits a verification path into its `(uid, token)` parts.
pub fn split_verification_path(path: &str) -> (String, String) {
    let parts: Vec<&str> = path
        .trim_start_matches("/api/auth/verify/")
        .trim_end_matches('/')
        .split('/')
        .collect();
    (parts[0].to_string(), parts[1].to_string())
}

/// Follows the verification link that was mailed to `email`.
pub async fn verify(
    client: &reqwest::Client,
    address: &str,
    mock_emailer: &MockEmailer,
    email: &str,
) -> Response {
    let sent = mock_emailer
        .last_sent_to(email)
        .expect("No verification email sent");
    let path = extract_verification_path(&sent.body_html);
    client
        .get(format!("{address}{path}"))
        .send()
        .await
        .expect("Failed to verify")
}

pub async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> Response {
    client
        .post(format!("{address}/api/auth/login/"))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Failed to login")
}

/// Full `Set-Cookie` line for a cookie name.
pub fn set_cookie_line(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|line| line.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

/// Value of a cookie set by the response.
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    set_cookie_line(response, name).map(|line| {
        line.split(';')
            .next()
            .unwrap_or_default()
            .trim_start_matches(&format!("{name}="))
            .to_string()
    })
}

/// Registers, verifies and logs in. Returns `(access_token, refresh_token)`.
pub async fn signed_in(
    client: &reqwest::Client,
    address: &str,
    mock_emailer: &MockEmailer,
    payload: &Value,
) -> (String, String) {
    let email = payload["email"].as_str().unwrap();
    let response = register(client, address, payload).await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let response = verify(client, address, mock_emailer, email).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let response = login(client, address, email, PASSWORD).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    (
        cookie_value(&response, "access_token").expect("No access cookie"),
        cookie_value(&response, "refresh_token").expect("No refresh cookie"),
    )
}

pub async fn startup_id_for(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT s.id FROM startup_profiles s JOIN users u ON u.id = s.user_id WHERE u.email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn investor_id_for(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT i.id FROM investor_profiles i JOIN users u ON u.id = i.user_id WHERE u.email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap()
}
