mod app;
mod attendance;
mod config;
mod dashboard;
mod error;
mod grades;
mod identity;
mod schedule;
mod state;
mod store;
mod subjects;
#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "eindex=debug,axum=info,tower_http=info".to_string());
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

    let state = state::AppState::init().await?;
    tracing::info!(
        utc_offset = %state.config.utc_offset,
        late_after = state.config.attendance.late_after_minutes,
        absent_after = state.config.attendance.absent_after_minutes,
        "attendance policy loaded"
    );

    app::serve(app::build_app(state)).await
}
