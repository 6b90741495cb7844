use accounts::{app, db, state::AppState};
use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "accounts=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;
    tracing::info!(
        base_url = ?app_state.http.base_url().map(|u| u.as_str()),
        timeout = ?app_state.config.http.timeout,
        "http client ready"
    );

    db::migrate(&app_state.db).await.context("run migrations")?;

    app::serve(app::build_app(app_state)).await
}
