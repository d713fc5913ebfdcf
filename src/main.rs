//! floodgate - Discord flood and raid moderation bot.

use floodgate::api::RestClient;
use floodgate::config::{self, Config};
use floodgate::handlers::Dispatcher;
use floodgate::network::{EventSink, GatewayClient};
use floodgate::security::{ActivityRegistry, SweepSchedule, spawn_sweeper};
use floodgate::state::{BotState, LifecycleManager};
use floodgate::{http, metrics};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::discover(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    info!(
        rate = config.limits.rate_per_second,
        burst = config.limits.burst,
        idle_secs = config.limits.idle_threshold_secs,
        prefix = %config.moderation.command_prefix,
        "Starting floodgate"
    );

    let lifecycle = LifecycleManager::new();

    // Prometheus metrics are optional.
    // Convention: metrics port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.metrics.port;
    let http_task = if metrics_port == 0 {
        info!("Metrics disabled");
        None
    } else {
        metrics::init();
        info!("Metrics initialized");

        let shutdown = lifecycle.subscribe();
        let task = tokio::spawn(async move {
            http::run_http_server(metrics_port, shutdown).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
        Some(task)
    };

    // Channel activity registry and its idle sweeper
    let registry = Arc::new(ActivityRegistry::new(&config.limits));
    let sweeper = spawn_sweeper(
        Arc::clone(&registry),
        SweepSchedule::from(&config.limits),
        lifecycle.subscribe(),
    );
    info!(
        interval_secs = config.limits.sweep_interval_secs,
        "Idle channel sweeper started"
    );

    let api = Arc::new(RestClient::new(&config.api, &config.bot_token)?);
    let state = Arc::new(BotState::new(api, registry, config.moderation.clone()));

    // Start lockdown cooldown pruning task (runs every sweep interval)
    let prune_task = {
        let state = Arc::clone(&state);
        let mut shutdown = lifecycle.subscribe();
        let period = config.limits.sweep_interval();
        let max_age = config.moderation.lockdown_cooldown();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = state.prune_lockdowns(max_age, tokio::time::Instant::now());
                        if removed > 0 {
                            info!(removed, "Expired lockdown cooldowns pruned");
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    };
    info!("Lockdown cooldown pruning task started");

    let sink: Arc<dyn EventSink> = Arc::new(Dispatcher::new(state));
    let gateway = GatewayClient::new(&config.api, config.bot_token.clone());
    let mut gateway_task = tokio::spawn(gateway.run(sink, lifecycle.subscribe()));
    info!("Bot is now running. Press CTRL-C to exit.");

    let fatal = tokio::select! {
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            None
        }
        result = &mut gateway_task => Some(result),
    };

    lifecycle.shutdown();

    let gateway_result = match fatal {
        Some(result) => result,
        None => gateway_task.await,
    };
    match sweeper.await {
        Ok(evicted) => info!(evicted, "Idle sweeper stopped"),
        Err(e) => warn!(error = %e, "Idle sweeper task failed"),
    }
    if let Err(e) = prune_task.await {
        warn!(error = %e, "Lockdown pruning task failed");
    }
    if let Some(task) = http_task {
        let _ = task.await;
    }

    match gateway_result {
        Ok(Ok(())) => {
            info!("floodgate stopped");
            Ok(())
        }
        Ok(Err(e)) => Err(e.into()),
        Err(e) => Err(e.into()),
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
