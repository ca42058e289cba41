use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use config::Config;
use services::analyzer::EntryAnalyzer;
use services::model_client::GeminiClient;
use services::mood_log::{CsvMoodLog, MoodLog};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: Arc<EntryAnalyzer>,
    pub mood_log: Arc<dyn MoodLog>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindful_journal_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let mood_log = CsvMoodLog::open(&config.mood_log_path)?;
    tracing::info!(path = %mood_log.path().display(), "Mood log ready");

    if !config.model_configured() {
        tracing::warn!("GEMINI_API_KEY is not set; every reflection will use the fallback");
    }
    let model = GeminiClient::new(
        &config.gemini_base_url,
        &config.gemini_model,
        &config.gemini_api_key,
        config.model_timeout(),
    )?;

    let state = AppState {
        config: config.clone(),
        analyzer: Arc::new(EntryAnalyzer::new(
            Arc::new(model),
            config.validation_policy(),
        )),
        mood_log: Arc::new(mood_log),
    };

    let app = router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/entries", post(handlers::entries::create_entry))
        .route("/api/history", get(handlers::history::get_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins = vec![config.frontend_url.clone()];
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        origins.extend(extra.split(',').map(|o| o.trim().to_string()));
    }

    let allowed: Vec<axum::http::HeaderValue> = origins
        .iter()
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
}

#[cfg(test)]
impl AppState {
    pub fn for_tests(
        model: services::model_client::ScriptedModel,
        mood_log: Arc<dyn MoodLog>,
    ) -> Self {
        Self {
            config: Arc::new(Config::for_tests("mood_history.csv".into())),
            analyzer: Arc::new(EntryAnalyzer::new(
                Arc::new(model),
                services::analyzer::ValidationPolicy::Permissive,
            )),
            mood_log,
        }
    }
}
