//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        HfEmotionClassifier, PerturbationExplainer, SpotifyAuthAdapter, SpotifyCatalogAdapter,
    },
    config::Config,
    error::ApiError,
    web::{
        analysis_form_handler, analysis_submit_handler, callback_handler, explain::RandomModeSelector,
        home_handler, login_handler, not_found_handler,
        session::{SessionStore, SessionTokenManager},
        state::AppState, welcome_handler,
    },
};
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Shared HTTP Client ---
    // One client for both the inference endpoint and the music provider.
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    // --- 3. Initialize Service Adapters ---
    let hf_api_token = config
        .hf_api_token
        .clone()
        .ok_or_else(|| ApiError::Internal("HF_API_TOKEN is required".to_string()))?;
    let classifier = Arc::new(HfEmotionClassifier::new(
        http_client.clone(),
        hf_api_token,
        &config.emotion_model,
    ));

    let explainer = Arc::new(PerturbationExplainer::new(
        config.explain_features,
        config.explain_samples,
    ));

    let music_auth = Arc::new(SpotifyAuthAdapter::new(
        http_client.clone(),
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
        config.spotify_redirect_uri.clone(),
    ));
    let catalog = Arc::new(SpotifyCatalogAdapter::new(http_client));

    // --- 4. Build the Shared AppState ---
    let sessions = SessionStore::new(config.secret_key.clone());
    let app_state = Arc::new(AppState {
        config: config.clone(),
        classifier,
        explainer,
        mode_selector: Arc::new(RandomModeSelector),
        tokens: SessionTokenManager::new(sessions, music_auth, catalog),
    });

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .route("/", get(welcome_handler))
        .route("/login", get(login_handler))
        .route("/callback", get(callback_handler))
        .route("/analysis", get(analysis_form_handler).post(analysis_submit_handler))
        .route("/home", get(home_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
