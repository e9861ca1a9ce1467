use chrono::Utc;

use dailyreport::services::user;
use dailyreport::{app, crypto, db, AppData, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://dailyreport.db".to_string());

    let db = db::connect(&database_url).await?;
    db::init_schema(&db).await?;

    // First boot: create the admin account with a generated password.
    if !user::admin_exists(&db).await? {
        let admin_password = crypto::generate_password();
        let admin_password_hash = crypto::hash_password(&admin_password).await?;
        user::create_admin(&db, "admin", &admin_password_hash, Utc::now()).await?;

        tokio::fs::write(
            "admin_credentials.txt",
            format!("Username: admin\nPassword: {}\n", admin_password),
        )
        .await?;
        log::info!("Admin credentials written to admin_credentials.txt");
    }

    let app_state = AppState::new(AppData::new(db));
    let app = app(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("Daily report server starting on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
