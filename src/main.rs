//! Account Ledger server
//!
//! Serves the account operations over HTTP, persisting accounts under a data
//! directory.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- [data_dir]
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `LEDGER_LISTEN_ADDR`: Address to bind (default `127.0.0.1:3000`)
//! - `LEDGER_DATA_DIR`: Data directory when no argument is given (default `db`)

use account_ledger::{http, AccountService, Config, LedgerError, Result};
use log::info;
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = Config::from_env()?;

    // An unusable id counter must stop startup
    let service = Arc::new(AccountService::open(&config.data_dir)?);
    info!(
        "Storing accounts under {}, last issued id {}",
        service.store().root().display(),
        service.last_issued_id()?
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config, service))
}

async fn serve(config: Config, service: Arc<AccountService>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .map_err(|e| {
            LedgerError::Config(format!("could not bind {}: {}", config.listen_addr, e))
        })?;
    info!("API server listening on {}", config.listen_addr);

    axum::serve(listener, http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        // No signal handler: run until killed
        Err(_) => std::future::pending::<()>().await,
    }
}
