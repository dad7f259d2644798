use rust_eligibility_dashboard::config::Config;
use rust_eligibility_dashboard::handlers::AppState;
use rust_eligibility_dashboard::scoring_client::ScoringClient;
use rust_eligibility_dashboard::shell;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the dashboard.
///
/// Initializes tracing, loads configuration, builds the scoring client and
/// the session store, then serves the dashboard with Axum.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_eligibility_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let scoring = ScoringClient::new(&config)?;
    tracing::info!("✓ Scoring client initialized: {}", config.scoring_api_url);

    let app_state = Arc::new(AppState::new(config.clone(), Arc::new(scoring)));
    tracing::info!(
        "Session store initialized ({}s idle expiry, {} max sessions)",
        config.session_idle_secs,
        config.max_sessions
    );

    let app = shell::router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Dashboard listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
