//! logkv CLI Client
//!
//! Command-line interface for interacting with logkv.

use std::time::Duration;

use clap::{Parser, Subcommand};
use logkv::network::Client;
use logkv::KvError;

/// logkv CLI
#[derive(Parser, Debug)]
#[command(name = "logkv-cli")]
#[command(about = "CLI for the logkv key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:16379")]
    server: String,

    /// Give up on a response after this many milliseconds (0 waits forever)
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let timeout = (args.timeout_ms > 0).then(|| Duration::from_millis(args.timeout_ms));
    if let Err(e) = client.set_timeout(timeout) {
        eprintln!("Failed to set timeout: {}", e);
        std::process::exit(1);
    }

    let result = match &args.command {
        Commands::Get { key } => client
            .get(key.as_bytes())
            .map(|value| println!("{}", String::from_utf8_lossy(&value))),
        Commands::Set { key, value } => client
            .set(key.as_bytes(), value.as_bytes())
            .map(|()| println!("OK")),
    };

    match result {
        Ok(()) => {}
        Err(KvError::NotFound) => {
            println!("(not found)");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
