use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ServeArgs, ServerConfig};
use crate::error::ServerError;
use mqtt_bus::{MqttBus, MqttConfig, spawn_consumer};
use net_state_server::AppState;
use node_registry::{
    CommandRelay, ExpanderPolicy, Ingest, NodeRegistry, NodeService, SubscriptionExpander,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run(args: ServeArgs) -> Result<(), ServerError> {
    tracing::info!("net-state starting");

    // --- Load config ---
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(config = %args.config, "loaded config");

    let (host, port) = config.mqtt.broker()?;
    let bind = args.bind.clone().unwrap_or_else(|| config.bind_addr());

    // --- CancellationToken for graceful shutdown ---
    let token = CancellationToken::new();

    // --- Bus client ---
    let mqtt = MqttConfig {
        host,
        port,
        client_id: config.mqtt.client_id.clone(),
        keepalive: config.mqtt.keepalive(),
        request_capacity: config.mqtt.request_capacity,
    };
    let prefix = config.runtime.topic_prefix.clone();
    let (bus, eventloop) = MqttBus::connect(&mqtt, std::slice::from_ref(&prefix));
    let bus = Arc::new(bus);
    tracing::info!(
        broker = %config.mqtt.server_address,
        client_id = %mqtt.client_id,
        prefix = %prefix,
        "mqtt client created"
    );

    // --- Registry + ingest ---
    let registry = Arc::new(NodeRegistry::new());
    let policy = ExpanderPolicy {
        unsubscribe_on_stop: config.runtime.unsubscribe_on_stop,
    };
    let ingest = Arc::new(Ingest::new(
        registry.clone(),
        SubscriptionExpander::new(bus.clone(), policy),
    ));

    // --- API server (HTTP + WS) ---
    let listener = net_state_server::bind(&bind).await?;
    let state = AppState::new(NodeService::new(registry), CommandRelay::new(bus.clone()));

    let consumer = spawn_consumer(eventloop, bus, ingest, token.clone());

    let api_token = token.clone();
    let api = tokio::spawn(async move {
        if let Err(e) = net_state_server::serve(listener, state, api_token).await {
            tracing::error!(error = %e, "api server error");
        }
    });

    let handles: Vec<(&'static str, JoinHandle<()>)> =
        vec![("mqtt consumer", consumer), ("api server", api)];

    tracing::info!(bind = %bind, "api server (http+ws) listening");
    tracing::info!("server ready");

    // --- Ожидание Ctrl+C ---
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down...");

    // Signal all tasks to stop cooperatively
    token.cancel();

    // Drain: each task gets up to SHUTDOWN_GRACE, then it is aborted
    for (name, mut handle) in handles {
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(task = name, error = %e, "task failed"),
            Err(_) => {
                tracing::warn!(task = name, "task did not stop in time, aborting");
                handle.abort();
                let _ = handle.await;
            }
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
