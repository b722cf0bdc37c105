//! Lobby Controller
//!
//! Runs bounded game lobbies with FIFO overflow queues behind a chat command
//! surface.
//!
//! # Servers
//!
//! - Console command reader on stdin, one `<channel> <author> <message>` per line
//! - HTTP server for health endpoints and metrics (default: 0.0.0.0:8081)
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Initialize actor system (`LobbyControllerActorHandle`)
//! 4. Create the status channel and lobby category, then spawn the effect
//!    worker against the resource provider
//! 5. Start health HTTP server (liveness, readiness, metrics)
//! 6. Start the console command reader
//! 7. Wait for shutdown signal, then drain every lobby and tear down the
//!    status channel and lobby category

#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)] // main.rs orchestrates startup, naturally longer

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use lobby_controller::actors::LobbyControllerActorHandle;
use lobby_controller::commands::{CommandDispatcher, ConsoleLine};
use lobby_controller::config::Config;
use lobby_controller::effects::{release_all, EffectFailure, EffectWorkerHandle};
use lobby_controller::observability::{health_router, init_metrics_recorder, HealthState};
use lobby_controller::resources::{ResourceProvider, TracingResourceProvider};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Buffer for effect failure reports.
const FAILURE_CHANNEL_BUFFER: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lobby_controller=debug,lc=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lobby Controller");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        lc_id = %config.lc_id,
        max_lobbies = config.max_lobbies,
        max_players = config.max_players,
        commands_channel = %config.commands_channel,
        status_channel = %config.status_channel,
        health_bind_address = %config.health_bind_address,
        "Configuration loaded successfully"
    );

    // This must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    let health_state = Arc::new(HealthState::new());

    // Initialize actor system
    let controller = LobbyControllerActorHandle::new(config.lc_id.clone(), config.registry_limits());
    info!("Actor system initialized");

    // Every task below stops when the controller's token is cancelled
    let shutdown_token = controller.child_token();

    let provider = Arc::new(TracingResourceProvider::new(
        config.category_name.clone(),
        config.status_channel.clone(),
    ));
    provider.ensure_containers().await.map_err(|e| {
        error!(error = %e, "Failed to set up status channel and lobby category");
        format!("Failed to set up resource containers: {e}")
    })?;
    let (failures_tx, failures_rx) = mpsc::channel(FAILURE_CHANNEL_BUFFER);
    let (effects, effects_task) = EffectWorkerHandle::spawn(
        provider,
        controller.clone(),
        Some(failures_tx),
        shutdown_token.child_token(),
    );
    tokio::spawn(report_failures(failures_rx));
    info!("Effect worker started");

    // Start health HTTP server (MUST succeed - fail startup if it doesn't)
    let health_addr: SocketAddr = config.health_bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.health_bind_address, "Invalid health bind address");
        format!("Invalid health bind address: {e}")
    })?;

    let metrics_router = Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );
    let app = health_router(Arc::clone(&health_state), controller.clone()).merge(metrics_router);

    // Bind listener BEFORE spawning to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(health_addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %health_addr, "Failed to bind health server");
            format!("Failed to bind health server to {health_addr}: {e}")
        })?;

    let health_shutdown_token = shutdown_token.child_token();
    tokio::spawn(async move {
        info!(addr = %health_addr, "Health server starting");
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            health_shutdown_token.cancelled().await;
            info!("Health server shutting down");
        });
        if let Err(e) = server.await {
            error!(error = %e, "Health server failed");
        }
    });

    let dispatcher = CommandDispatcher::new(&config, controller.clone(), effects.clone());
    tokio::spawn(run_console(dispatcher, shutdown_token.child_token()));

    health_state.set_ready();
    info!("Lobby Controller running - press Ctrl+C to shutdown");

    shutdown_signal().await;

    info!("Shutdown signal received, draining lobbies...");
    health_state.set_not_ready();

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_seconds);
    match release_all(&controller, &effects, shutdown_timeout).await {
        Ok(()) => info!("Lobby resources released"),
        Err(e) => warn!(error = %e, "Lobby resources not fully released"),
    }

    // Propagates to the effect worker, console reader and health server
    controller.cancel();
    if let Err(e) = effects_task.await {
        warn!(error = %e, "Effect worker task failed");
    }

    info!("Lobby Controller shutdown complete");

    Ok(())
}

/// Read console commands until stdin closes or shutdown begins.
async fn run_console(dispatcher: CommandDispatcher, cancel_token: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,

            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let Some(input) = ConsoleLine::parse(&line) else {
                            if !line.trim().is_empty() {
                                warn!(target: "lc.commands", "Expected `<channel> <author> <message>`");
                            }
                            continue;
                        };

                        for reply in dispatcher.dispatch(input.channel, input.author, input.text).await {
                            info!(target: "lc.commands", channel = %input.channel, "{reply}");
                        }
                    }
                    Ok(None) => {
                        info!(target: "lc.commands", "Console input closed");
                        break;
                    }
                    Err(e) => {
                        error!(target: "lc.commands", error = %e, "Failed to read console input");
                        break;
                    }
                }
            }
        }
    }
}

/// Surface failed effects that may have left platform resources behind.
async fn report_failures(mut failures: mpsc::Receiver<EffectFailure>) {
    while let Some(failure) = failures.recv().await {
        if failure.kind.starts_with("delete_") {
            error!(
                target: "lc.effects",
                lobby_id = %failure.lobby_id,
                kind = failure.kind,
                error = %failure.error,
                "Lobby resource could not be removed and needs manual cleanup"
            );
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
