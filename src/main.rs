//! PipeWatch - sewer camera severity monitoring server.

use pipewatch::config::ServerConfig;
use pipewatch::feed::{self, Feed, History, Simulator};
use pipewatch::web::Server;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pipewatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting PipeWatch on port {}...", cfg.http_port);

    // Initial fleet
    let readings = match &cfg.seed_path {
        Some(path) => feed::load_seed(path)?,
        None => {
            tracing::info!("No seed file configured, generating {} segments", cfg.segments);
            feed::generate_fleet(cfg.segments.max(1), &mut StdRng::from_entropy())
        }
    };

    // History and live fan-out
    let history = Arc::new(RwLock::new(History::new(cfg.retention())?));
    let (live_tx, _) = broadcast::channel(64);
    let (snapshot_tx, snapshot_rx) = mpsc::channel(100);
    tokio::spawn(feed::run_history_writer(snapshot_rx, history.clone(), live_tx.clone()));

    // Start feed
    let live_feed = Feed::new(cfg.tick());
    live_feed.start(Simulator::from_entropy(readings), snapshot_tx).await;

    // Start web server
    let server = Server::new(cfg, history, live_tx);
    server.start().await?;

    live_feed.stop().await;

    Ok(())
}
