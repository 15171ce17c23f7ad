//! # An In-Memory Cache Server

use clap::Parser;
use log::info;
use rescache::cli::Args;
use rescache::config::init_logging;
use rescache::errors::ApplicationError;
use rescache::expiry::eviction_loop;
use rescache::server::Server;
use rescache::storage::Store;
use rescache::types::SharedStore;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    init_logging();
    info!("Starting the server...");

    let args = Args::parse();

    let storage: SharedStore = Arc::new(Mutex::new(Store::new()));

    let evictor_store = Arc::clone(&storage);
    tokio::spawn(eviction_loop(evictor_store));

    let server = Server::new(&args, Arc::clone(&storage)).await?;

    // Dropping out of main tears down the runtime, which cancels the
    // connection tasks and the reaper.
    tokio::select! {
        result = server.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("CTRL+C received. Shutting down...");
        }
    }

    Ok(())
}
