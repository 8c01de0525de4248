mod app;
mod config;
mod error;
mod gemini;
mod plans;
mod shopping;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealplanner=debug,axum=info,tower_http=info".to_string());
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

    let app_state = state::AppState::init()?;
    tracing::info!(
        models = ?app_state.requester.models(),
        schema = ?app_state.config.planner.schema_version,
        macro_policy = ?app_state.config.planner.macro_policy,
        "meal planner configured"
    );
    if config::api_key_from_env().is_none() {
        tracing::warn!("API_KEY is not set; plan requests will fail until it is configured");
    }

    app::serve(app::build_app(app_state)).await
}
