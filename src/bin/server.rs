//! logkv Server Binary
//!
//! Starts the TCP server for logkv.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use logkv::config::{RecoveryMode, SyncStrategy};
use logkv::network::Server;
use logkv::{Config, StorageKv};
use tracing_subscriber::{fmt, EnvFilter};

/// logkv Server
#[derive(Parser, Debug)]
#[command(name = "logkv-server")]
#[command(about = "Append-only log key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./logkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:16379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// fsync the log after every write
    #[arg(long)]
    sync_every_write: bool,

    /// What to do with a torn record at the end of the log
    #[arg(short, long, value_enum, default_value = "strict")]
    recovery: Recovery,

    /// Close connections idle for this many milliseconds (0 = never)
    #[arg(long, default_value = "0")]
    idle_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Recovery {
    /// Refuse to start
    Strict,
    /// Drop the torn record and start
    TruncateTail,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,logkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("logkv Server v{}", logkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = if args.sync_every_write {
        SyncStrategy::EveryWrite
    } else {
        SyncStrategy::OsBuffered
    };
    let recovery_mode = match args.recovery {
        Recovery::Strict => RecoveryMode::Strict,
        Recovery::TruncateTail => RecoveryMode::TruncateTail,
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .sync_strategy(sync_strategy)
        .recovery_mode(recovery_mode)
        .read_timeout_ms(args.idle_timeout_ms)
        .build();

    // Open engine
    let engine = match StorageKv::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Engine initialized: {} keys, {} bytes of log",
        engine.key_count(),
        engine.log_len()
    );

    let server = match Server::bind(config, Arc::clone(&engine)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
