use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pelada::{
    api, auth, llm, persist,
    session::QuizConfig,
    source::{LlmQuestionGenerator, QuestionGenerator, RandomShuffle},
    state::AppState,
};

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pelada=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pelada...");

    let auth_config = Arc::new(auth::AuthConfig::from_env());
    let quiz_config = QuizConfig::from_env();
    let persist_config = persist::PersistConfig::from_env();

    let llm_config = llm::LlmConfig::from_env();
    let generator: Option<Arc<dyn QuestionGenerator>> = match llm_config.build_manager() {
        Ok(manager) => {
            tracing::info!("LLM providers initialized successfully");
            Some(Arc::new(LlmQuestionGenerator::new(
                Arc::new(manager),
                llm_config.default_max_tokens,
                llm_config.default_timeout,
            )))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize LLM providers: {}. Sessions will use stored and built-in questions.",
                e
            );
            None
        }
    };

    let state = Arc::new(AppState::new(
        &quiz_config,
        generator,
        Arc::new(RandomShuffle),
        auth_config,
    ));

    if let Some(path) = &persist_config.data_file {
        match state.load_snapshot(path).await {
            Ok(true) => tracing::info!("Restored data from {}", path.display()),
            Ok(false) => tracing::info!("No data file at {}, starting empty", path.display()),
            Err(e) => {
                tracing::error!("Could not restore {}: {}", path.display(), e);
                return Err(std::io::Error::other(e));
            }
        }
        persist::spawn_autosave(
            state.clone(),
            path.clone(),
            persist_config.autosave_interval,
        );
    } else {
        tracing::warn!("DATA_FILE not set, questions and profiles will not survive a restart");
    }

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, api::router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &persist_config.data_file {
        if let Err(e) = state.save_snapshot(path).await {
            tracing::error!("Final save to {} failed: {}", path.display(), e);
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
