mod chat_payload;
mod config;
mod error_response;
mod question_payload;
mod routes;
mod session_response;
mod state;

use std::sync::Arc;
use std::time::Duration;
use travel_assistant::{GeminiService, InteractionLog};

use crate::config::Config;
use crate::routes::create_router;
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{:#}", e);
        eprintln!("Failed to start travel assistant: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let gemini = GeminiService::new(config.gemini.clone())?;
    let model_name = gemini.model().to_string();

    let interactions = match &config.interaction_log {
        Some(path) => {
            log::info!("Recording interactions to {}", path.display());
            InteractionLog::new(path)
        }
        None => InteractionLog::disabled(),
    };

    let state = AppState::new(
        Arc::new(gemini),
        model_name,
        config.qa_domain.clone(),
        interactions,
    );

    match config.session_ttl {
        Some(ttl) => {
            log::info!("Expiring sessions idle for {} minutes", ttl.as_secs() / 60);
            state.sessions.spawn_idle_sweep(ttl, SESSION_SWEEP_INTERVAL);
        }
        None => log::info!("Session expiry disabled"),
    }

    let app = create_router(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    println!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
