//! Catalog RPC Server - JSON-RPC backend for catalog front ends.
//!
//! This binary provides a JSON-RPC 2.0 server that wraps the catalog-core
//! library for communication with an out-of-process UI.

use anyhow::{Context, Result};
use catalog_core::{Catalog, CatalogConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "catalog-rpc")]
#[command(about = "JSON-RPC server for the dataset catalog")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value = "0")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Catalog root directory (defaults to <data dir>/dataset-catalog)
    #[arg(long)]
    catalog_root: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Catalog RPC Server");

    let catalog_root = match args.catalog_root {
        Some(path) => path,
        None => dirs::data_dir()
            .context("No data directory on this platform; pass --catalog-root")?
            .join("dataset-catalog"),
    };
    info!("Catalog root: {}", catalog_root.display());

    let config = match &args.config {
        Some(path) => CatalogConfig::from_json_file(path)?,
        None => CatalogConfig::default(),
    };

    let catalog = Catalog::builder(&catalog_root)
        .config(config)
        .build()
        .await?;

    // Start the server
    let addr = catalog_rpc::start_server(catalog.clone(), &args.host, args.port).await?;

    // Print port for the front end to read (intentional stdout for IPC)
    println!("RPC_PORT={}", addr.port());

    info!("RPC server running on {}", addr);

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    catalog.shutdown().await?;

    Ok(())
}
