//! Jarcast Server
//!
//! Watches a Monobank jar and turns every incoming donation into a stream
//! overlay notification.

mod api;
mod config;
mod console;
mod jar_select;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use jarcast_core::events::{OVERLAY_BROADCAST_BUFFER, donation_channel, manual_trigger_channel};
use jarcast_core::hooks::{DonationHook, MusicQueue, MusicQueueRunner};
use jarcast_core::ledger::MonobankClient;
use jarcast_core::media::{MediaLibrary, MediaSelector};
use jarcast_core::overlay::BroadcastOverlay;
use jarcast_core::processors::{
    DonationFeed, DonationFeedRunner, DonationPoller, ManualTriggerRunner, NotificationPresenter,
    NotificationSequencer,
};
use server::{build_router, run_server};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Jarcast - Monobank jar donation alerts for stream overlays
#[derive(Parser, Debug)]
#[command(name = "jarcast-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./jarcast.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Monobank personal API token, overrides `ledger.token`
    #[arg(long, env = "MONOBANK_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Do not read test donations from stdin
    #[arg(long, default_value = "false")]
    no_console: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting jarcast-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader =
        ConfigLoader::new(&args.config, args.listen).with_token_override(args.token);
    let config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", config_loader.config_path());

    let client = MonobankClient::new(&config.ledger);

    // Pick a jar if none is configured yet
    let jar_id = match config.jar_id.clone() {
        Some(jar_id) => jar_id,
        None => match jar_select::select_jar(&client).await? {
            Some(jar) => {
                tracing::info!(title = %jar.title, id = %jar.id, "Selected jar");
                config_loader.persist_jar_id(&jar.id)?;
                jar.id
            }
            None => {
                tracing::info!("No jar selected, exiting");
                return Ok(());
            }
        },
    };

    // Media pools and selection
    let library = MediaLibrary::scan(&config.media.root);
    let selector = Arc::new(MediaSelector::new(config.media.rules.clone(), library));

    // Overlay and display pipeline
    let overlay = BroadcastOverlay::new(OVERLAY_BROADCAST_BUFFER);
    let presenter = Arc::new(NotificationPresenter::new(
        selector,
        Arc::new(overlay.clone()),
        config.media.display_duration,
    ));
    let mut sequencer = NotificationSequencer::new(presenter.clone(), config.media.display_buffer);
    let mut poller = DonationPoller::new(
        Arc::new(client),
        sequencer.queue(),
        config.poller_config(jar_id),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = Vec::new();

    // Donation feed
    let feed = Arc::new(DonationFeed::new(config.feed.capacity));
    let (feed_tx, feed_rx) = donation_channel();
    poller.on_new_donation(DonationHook::forward("donation-feed", feed_tx));
    workers.push(tokio::spawn(
        DonationFeedRunner::new(feed.clone(), feed_rx, shutdown_rx.clone()).run(),
    ));

    // Music request queue
    if config.music.enabled {
        let queue = MusicQueue::load(&config.music.queue_file).await;
        let (music_tx, music_rx) = donation_channel();
        poller.on_new_donation(DonationHook::forward("music-queue", music_tx));
        let runner = MusicQueueRunner::new(queue, music_rx, shutdown_rx.clone());
        workers.push(tokio::spawn(async move {
            runner.run().await;
        }));
    }

    // Manual test triggers
    let (trigger_tx, trigger_rx) = manual_trigger_channel();
    workers.push(tokio::spawn(
        ManualTriggerRunner::new(presenter.clone(), trigger_rx, shutdown_rx.clone()).run(),
    ));
    if !args.no_console {
        if let Err(e) = console::spawn_console_listener(trigger_tx.clone()) {
            tracing::warn!(error = %e, "Failed to start console listener");
        }
    }

    // Start the pipeline
    sequencer.start();
    poller.start();

    // Build the router
    let state = AppState::new(overlay, feed, trigger_tx, config.media.root.clone());
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", config.listen);
    let result = run_server(router, config.listen).await;

    // Stop the pipeline, then the workers
    tracing::info!("Stopping donation pipeline...");
    poller.stop().await;
    sequencer.stop().await;
    presenter.clear();

    let _ = shutdown_tx.send(true);
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Worker task failed");
        }
    }
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jarcast_core=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
