//! Travel Buddy application binary - composition root.
//!
//! 1. Load configuration from TOML, overlay env vars and CLI flags
//! 2. Validate it; any configuration error is fatal
//! 3. Build the completion and place-search clients
//! 4. Start the idle-session sweep
//! 5. Serve the HTTP API until Ctrl-C

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use buddy_api::auth::generate_token;
use buddy_api::{routes, AppState};
use buddy_chat::{QueryRouter, RouterConfig, SessionStore};
use buddy_core::{ErrorKind, TravelConfig};
use buddy_llm::AzureOpenAiClient;
use buddy_places::GooglePlacesClient;

use cli::CliArgs;

/// Periodically drop sessions idle longer than the configured timeout.
async fn session_sweep_loop(store: Arc<SessionStore>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        store.expire_idle();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if args.generate_token {
        println!("{}", generate_token());
        return Ok(());
    }

    let config_file = args.resolve_config_path();
    if args.init_config {
        TravelConfig::default().save(&config_file)?;
        println!("Wrote default configuration to {}", config_file.display());
        return Ok(());
    }

    // Config.
    let mut config = TravelConfig::load_or_default(&config_file);
    config.apply_env_overrides();
    if let Some(port) = args.port {
        config.general.port = port;
    }
    if let Some(ref bind) = args.bind {
        config.general.bind_address = bind.clone();
    }
    if let Some(ref level) = args.log_level {
        config.general.log_level = level.clone();
    }

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Travel Buddy v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!(
            error_kind = ErrorKind::ConfigurationError.as_str(),
            error = %e,
            "Refusing to start"
        );
        return Err(e.into());
    }

    // Clients.
    let completion = Arc::new(AzureOpenAiClient::new(&config.completion, &config.http)?);
    let places = Arc::new(GooglePlacesClient::new(&config.places, &config.http)?);
    tracing::info!(
        deployment = %config.completion.deployment,
        max_results = config.places.max_results,
        "Clients ready"
    );

    // Conversation core.
    let store = Arc::new(SessionStore::new(
        config.session.retained_turns,
        config.session.idle_timeout_minutes,
    ));
    let router = Arc::new(QueryRouter::new(
        completion,
        places,
        Arc::clone(&store),
        RouterConfig::from_config(&config),
    ));

    // === Background tasks ===

    let sweep_store = Arc::clone(&store);
    let sweep_secs = config.session.sweep_interval_secs;
    tokio::spawn(async move {
        session_sweep_loop(sweep_store, sweep_secs).await;
    });

    // === API server ===

    if config.general.api_token.is_none() {
        tracing::warn!("No API token configured; session routes are unauthenticated");
    }

    let state = AppState::new(&config, router);
    if let Err(e) = routes::start_server(&config, state, shutdown_signal()).await {
        tracing::error!(error = %e, "API server failed");
        return Err(e.into());
    }

    Ok(())
}
