//! Process configuration.
//!
//! Values come from the command line first, then the environment, then
//! built-in defaults.

use crate::error::{LedgerError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable holding the listen address.
pub const ENV_LISTEN_ADDR: &str = "LEDGER_LISTEN_ADDR";

/// Environment variable holding the data directory.
pub const ENV_DATA_DIR: &str = "LEDGER_DATA_DIR";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "db";

/// Runtime settings for the ledger server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Directory holding account records and the id counter.
    pub data_dir: PathBuf,
}

impl Config {
    /// Builds the configuration from process arguments and environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Builds the configuration from explicit sources.
    ///
    /// `args` excludes the program name. At most one positional argument, the
    /// data directory, is accepted.
    pub fn resolve<I, F>(args: I, env: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() > 1 {
            return Err(LedgerError::Config(
                "Too many arguments. Usage: account-ledger [data_dir]".to_string(),
            ));
        }

        let listen_raw = env(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw.parse::<SocketAddr>().map_err(|e| {
            LedgerError::Config(format!(
                "Invalid listen address {:?} in {}: {}",
                listen_raw, ENV_LISTEN_ADDR, e
            ))
        })?;

        let data_dir = args
            .into_iter()
            .next()
            .or_else(|| env(ENV_DATA_DIR))
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        Ok(Config {
            listen_addr,
            data_dir: PathBuf::from(data_dir),
        })
    }
}
