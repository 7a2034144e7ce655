//! # Account Ledger
//!
//! A minimal account ledger service: creates account records, reads them by
//! identifier, adjusts their balance, and deletes them. Each account is
//! persisted as an individual JSON file.
//!
//! ## Design Principles
//!
//! - **Never reuse ids**: a persisted counter only moves forward
//! - **One file per account**: `<data_dir>/<id>.json`, replaced atomically on save
//! - **Per-account critical sections**: read-modify-write on one id is serialised
//! - **Thin boundary**: the HTTP layer only parses, dispatches and renders
//!
//! ## Example
//!
//! ```no_run
//! use account_ledger::AccountService;
//!
//! let service = AccountService::open("db").unwrap();
//! let account = service.create("Ada", "Lovelace").unwrap();
//! let account = service.adjust_balance(account.id, 500).unwrap();
//! assert_eq!(account.balance, 500);
//! ```

pub mod account;
pub mod allocator;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod store;

pub use account::Account;
pub use allocator::{FileIdAllocator, IdAllocator};
pub use config::Config;
pub use error::{LedgerError, Result};
pub use service::AccountService;
pub use store::RecordStore;
