//! File-per-record persistence for accounts.
//!
//! Each account lives at `<root>/<id>.json`. The mapping is computed in one
//! place, [`RecordStore::path_for`]; nothing else formats record paths.

use crate::account::Account;
use crate::error::{LedgerError, Result};
use log::debug;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Maps account identifiers to JSON files under a records root.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// the first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RecordStore { root: root.into() }
    }

    /// Returns the records root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the on-disk location of the record for `id`.
    pub fn path_for(&self, id: u64) -> PathBuf {
        self.root.join(format!("{}.json", id))
    }

    /// Writes `account` to its path, replacing any previous record.
    pub fn save(&self, account: &Account) -> Result<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| LedgerError::storage("create directory", &self.root, e))?;

        let path = self.path_for(account.id);
        let bytes = serde_json::to_vec(account)
            .map_err(|e| LedgerError::storage("encode", &path, e.into()))?;

        write_atomic(&path, &bytes).map_err(|e| LedgerError::storage("write", &path, e))?;
        debug!("Saved account {} to {}", account.id, path.display());
        Ok(())
    }

    /// Reads the record for `id`.
    pub fn load(&self, id: u64) -> Result<Account> {
        let path = self.path_for(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LedgerError::NotFound { id })
            }
            Err(e) => return Err(LedgerError::storage("read", &path, e)),
        };

        let account: Account =
            serde_json::from_slice(&data).map_err(|e| LedgerError::decode(&path, e))?;

        if account.id != id {
            return Err(LedgerError::decode(
                &path,
                format!("record holds id {}, expected {}", account.id, id),
            ));
        }

        debug!("Loaded account {} from {}", id, path.display());
        Ok(account)
    }

    /// Removes the record for `id`.
    pub fn delete(&self, id: u64) -> Result<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(LedgerError::NotFound { id }),
            Err(e) => Err(LedgerError::storage("remove", &path, e)),
        }
    }
}

/// Replaces the contents of `path` with `bytes`.
///
/// The data is written to a sibling temporary file and renamed into place, so
/// a failure leaves the previous contents untouched.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| -> io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
