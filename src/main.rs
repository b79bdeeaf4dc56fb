// Connection orchestration worker
//
// Serves the connection message patterns over newline-delimited JSON on
// stdin/stdout. Outbound agent and webhook-subscriber requests go out on the
// same stream and their replies are expected back on stdin.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use agent_connections::{
    BusAgentClient, BusClient, ConnectionConfig, ConnectionService, Dispatcher, LineTransport,
    MemoryCache, MemoryStore, OrgAgent, Worker,
};

/// JSON array of org-agent records loaded into the store at startup
const ORG_AGENTS_FILE_VAR: &str = "ORG_AGENTS_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ConnectionConfig::from_env().context("Invalid worker configuration")?;
    log::info!(
        "Starting agent-connections worker v{} (agent timeout {}s)",
        agent_connections::VERSION,
        config.agent_request_timeout.as_secs()
    );

    let store = Arc::new(MemoryStore::new());
    let seeded = seed_org_agents(&store).await?;
    if seeded > 0 {
        log::info!("Loaded {seeded} org agents");
    }

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let bus = Arc::new(BusClient::new(outbound_tx.clone(), config.agent_request_timeout));
    let agent = Arc::new(BusAgentClient::new(Arc::clone(&bus)));
    let cache = Arc::new(MemoryCache::new());
    let transport = LineTransport::stdio(config.max_line_bytes);

    let service = Arc::new(ConnectionService::new(store, agent, cache, config));
    let dispatcher = Dispatcher::new(service);

    Worker::new(transport, dispatcher, bus, outbound_tx, outbound_rx)
        .run()
        .await
        .context("Worker stopped with an error")?;

    log::info!("agent-connections worker stopped");
    Ok(())
}

async fn seed_org_agents(store: &MemoryStore) -> Result<usize> {
    let Ok(path) = std::env::var(ORG_AGENTS_FILE_VAR) else {
        return Ok(0);
    };

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {ORG_AGENTS_FILE_VAR}={path}"))?;
    let agents: Vec<OrgAgent> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse org agents from {path}"))?;

    let count = agents.len();
    for agent in agents {
        store.insert_org_agent(agent).await;
    }
    Ok(count)
}
