use std::env;
use std::net::SocketAddr;

use fundbridge::{app, utils::static_object::is_production, utils::telemetry::init_subscriber};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_subscriber(
        "fundbridge",
        "fundbridge=info,tower_http=info",
        is_production(),
    );

    let database_url = env::var("DATABASE_URL").expect("Env variable `DATABASE_URL` should be set");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
        error!(error = %e, "Failed to run database migrations");
        std::process::exit(1);
    }

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    info!("Server starting at http://{}", addr);

    axum::serve(
        listener,
        app(db_pool).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
