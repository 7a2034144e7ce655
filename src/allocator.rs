//! Identifier allocation backed by a persisted counter.
//!
//! The counter file holds the last issued id as a decimal string. Ids are
//! strictly increasing and never reused, deletions included.

use crate::error::{LedgerError, Result};
use crate::store::write_atomic;
use log::{debug, info};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Hands out unique account identifiers.
pub trait IdAllocator: Send + Sync {
    /// Returns the next unused identifier.
    fn next_id(&self) -> Result<u64>;
}

/// Allocator persisting its counter to `<data_dir>/last_id.txt`.
///
/// Calls to [`IdAllocator::next_id`] are serialised by an in-process lock, so
/// concurrent callers in one process never receive the same id.
#[derive(Debug)]
pub struct FileIdAllocator {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileIdAllocator {
    /// Name of the counter file inside the data directory.
    pub const COUNTER_FILE: &'static str = "last_id.txt";

    /// Opens the allocator, creating the data directory and a zeroed counter
    /// if needed. An existing counter must parse.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .map_err(|e| LedgerError::storage("create directory", data_dir, e))?;

        let allocator = FileIdAllocator {
            path: data_dir.join(Self::COUNTER_FILE),
            lock: Mutex::new(()),
        };

        if allocator.path.exists() {
            let last = allocator.read_counter()?;
            info!("Id counter at {} resumes after {}", allocator.path.display(), last);
        } else {
            allocator.write_counter(0)?;
            info!("Initialised id counter at {}", allocator.path.display());
        }

        Ok(allocator)
    }

    /// Returns the path of the counter file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last issued id, or 0 if none has been issued.
    pub fn last_issued(&self) -> Result<u64> {
        let _guard = self.lock.lock();
        self.read_counter()
    }

    fn read_counter(&self) -> Result<u64> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            // Never initialised: behave as if it held 0
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(LedgerError::storage("read", &self.path, e)),
        };

        text.trim().parse::<u64>().map_err(|e| {
            LedgerError::storage(
                "parse",
                &self.path,
                io::Error::new(io::ErrorKind::InvalidData, format!("counter {:?}: {}", text, e)),
            )
        })
    }

    fn write_counter(&self, value: u64) -> Result<()> {
        write_atomic(&self.path, value.to_string().as_bytes())
            .map_err(|e| LedgerError::storage("write", &self.path, e))
    }
}

impl IdAllocator for FileIdAllocator {
    fn next_id(&self) -> Result<u64> {
        let _guard = self.lock.lock();

        let last = self.read_counter()?;
        let next = last
            .checked_add(1)
            .ok_or_else(|| {
                LedgerError::storage("allocate", &self.path, io::Error::other("id space exhausted"))
            })?;

        self.write_counter(next)?;
        debug!("Allocated id {}", next);
        Ok(next)
    }
}
