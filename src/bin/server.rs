//! cfgstore Server Binary
//!
//! Starts the HTTP gateway over a file-backed store.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use cfgstore::config::SyncStrategy;
use cfgstore::gateway::Gateway;
use cfgstore::log::FileLog;
use cfgstore::{Config, VersionedStore};

/// cfgstore Server
#[derive(Parser, Debug)]
#[command(name = "cfgstore-server")]
#[command(about = "Versioned configuration store")]
#[command(version)]
struct Args {
    /// Durable store root directory
    #[arg(short, long, default_value = "./cfgstore_data")]
    data_dir: String,

    /// Logical database name
    #[arg(long, default_value = "cfgstore")]
    database: String,

    /// Record collection name
    #[arg(long, default_value = "configs")]
    collection: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:3400")]
    listen: String,

    /// fsync after every N appends (1 = every write)
    #[arg(long, default_value = "1")]
    sync_every: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cfgstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("cfgstore Server v{}", cfgstore::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = if args.sync_every <= 1 {
        SyncStrategy::EveryWrite
    } else {
        SyncStrategy::EveryNAppends {
            count: args.sync_every,
        }
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .database(&args.database)
        .collection(&args.collection)
        .listen_addr(&args.listen)
        .sync_strategy(sync_strategy)
        .build();

    // Open the durable log; unreachable storage is fatal
    let log = match FileLog::open(&config.log_path(), config.sync_strategy) {
        Ok(log) => log,
        Err(e) => {
            tracing::error!("Failed to open durable log: {}", e);
            std::process::exit(1);
        }
    };

    // Reconstruct the latest-version cache before serving any traffic
    let store = VersionedStore::new(Box::new(log));
    if let Err(e) = store.init() {
        tracing::error!("Failed to initialize store: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Store initialized successfully");

    // Serve
    let gateway = Gateway::new(config.listen_addr.clone(), Arc::new(store));
    if let Err(e) = gateway.run().await {
        tracing::error!("Gateway error: {}", e);
        std::process::exit(1);
    }
}
