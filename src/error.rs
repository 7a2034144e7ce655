//! Error types for the account ledger.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while serving ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed identifier, request body or out-of-range arithmetic
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No record exists for the identifier
    #[error("account not found: {id}")]
    NotFound { id: u64 },

    /// Underlying read, write or remove failed
    #[error("could not {op} {}: {source}", path.display())]
    Storage {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// On-disk content is not a valid encoding
    #[error("could not decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Startup configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The server runtime itself failed
    #[error("server error: {0}")]
    Server(#[from] io::Error),
}

impl LedgerError {
    pub(crate) fn storage(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        LedgerError::Storage {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        LedgerError::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` when the failure was caused by the caller's input or by
    /// the state of the addressed record, rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidArgument(_) | LedgerError::NotFound { .. } | LedgerError::Decode { .. }
        )
    }
}
