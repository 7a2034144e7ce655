//! Account operations on top of the allocator and the record store.
//!
//! Every operation on a given id runs inside that id's critical section, so
//! concurrent balance adjustments on one account cannot lose updates, while
//! operations on different accounts never contend.

use crate::account::Account;
use crate::allocator::{FileIdAllocator, IdAllocator};
use crate::error::Result;
use crate::store::RecordStore;
use dashmap::DashMap;
use log::{debug, info};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// The account service.
///
/// Stateless per request: each call is a single load/save/remove against the
/// store. A lock entry lives only while some call on its id is in flight.
pub struct AccountService<A = FileIdAllocator> {
    allocator: A,
    store: RecordStore,
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl AccountService<FileIdAllocator> {
    /// Opens a service persisting under `data_dir`.
    ///
    /// Fails if the id counter cannot be initialised; callers should treat
    /// that as fatal.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let allocator = FileIdAllocator::open(data_dir)?;
        Ok(AccountService::new(allocator, RecordStore::new(data_dir)))
    }

    /// Returns the last id handed out, or 0 before the first create.
    pub fn last_issued_id(&self) -> Result<u64> {
        self.allocator.last_issued()
    }
}

impl<A: IdAllocator> AccountService<A> {
    /// Creates a service from its parts.
    pub fn new(allocator: A, store: RecordStore) -> Self {
        AccountService {
            allocator,
            store,
            locks: DashMap::new(),
        }
    }

    /// Returns the underlying record store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Creates an account with a fresh id and a zero balance.
    ///
    /// If saving fails after allocation, the id stays consumed.
    pub fn create(&self, first_name: &str, last_name: &str) -> Result<Account> {
        let id = self.allocator.next_id()?;
        let account = Account::new(id, first_name, last_name);

        self.with_lock(id, || self.store.save(&account))?;

        info!("Created account {}", id);
        Ok(account)
    }

    /// Reads an account.
    pub fn get(&self, id: u64) -> Result<Account> {
        self.with_lock(id, || self.store.load(id))
    }

    /// Adds `delta` to the account's balance and persists the result.
    pub fn adjust_balance(&self, id: u64, delta: i64) -> Result<Account> {
        self.with_lock(id, || {
            let mut account = self.store.load(id)?;
            account.adjust(delta)?;
            self.store.save(&account)?;

            debug!(
                "Adjusted account {} by {}, balance now {}",
                id, delta, account.balance
            );
            Ok(account)
        })
    }

    /// Removes an account. Its id is never reissued.
    pub fn delete(&self, id: u64) -> Result<()> {
        self.with_lock(id, || self.store.delete(id))?;
        info!("Deleted account {}", id);
        Ok(())
    }

    fn with_lock<T>(&self, id: u64, f: impl FnOnce() -> Result<T>) -> Result<T> {
        // Clone out of the map so the shard guard is released before blocking
        let lock = Arc::clone(
            self.locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        let guard = lock.lock();
        let result = f();

        // Clones are only taken under the shard lock, so a count of 2 (map and
        // this handle) means nobody else is waiting on this id
        self.locks
            .remove_if(&id, |_, entry| Arc::strong_count(entry) == 2);
        drop(guard);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use std::io;
    use std::thread;
    use tempfile::TempDir;

    struct FailingAllocator;

    impl IdAllocator for FailingAllocator {
        fn next_id(&self) -> Result<u64> {
            Err(LedgerError::storage(
                "read",
                "last_id.txt",
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            ))
        }
    }

    fn service() -> (TempDir, AccountService) {
        let dir = TempDir::new().unwrap();
        let service = AccountService::open(dir.path()).unwrap();
        (dir, service)
    }

    #[test]
    fn test_create_then_get() {
        let (_dir, service) = service();

        let created = service.create("Ada", "Lovelace").unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.balance, 0);

        assert_eq!(service.get(created.id).unwrap(), created);
    }

    #[test]
    fn test_sequential_creates_get_consecutive_ids() {
        let (_dir, service) = service();
        assert_eq!(service.create("a", "b").unwrap().id, 1);
        assert_eq!(service.create("c", "d").unwrap().id, 2);
    }

    #[test]
    fn test_balance_scenario() {
        let (_dir, service) = service();
        let id = service.create("", "").unwrap().id;

        assert_eq!(service.adjust_balance(id, 500).unwrap().balance, 500);
        assert_eq!(service.adjust_balance(id, -200).unwrap().balance, 300);
        assert_eq!(service.get(id).unwrap().balance, 300);

        service.delete(id).unwrap();
        assert!(matches!(service.get(id), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_operations_on_unknown_id_are_not_found() {
        let (_dir, service) = service();

        assert!(matches!(service.get(7), Err(LedgerError::NotFound { id: 7 })));
        assert!(matches!(
            service.adjust_balance(7, 10),
            Err(LedgerError::NotFound { id: 7 })
        ));
        assert!(matches!(service.delete(7), Err(LedgerError::NotFound { id: 7 })));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_dir, service) = service();
        let first = service.create("a", "b").unwrap().id;
        service.delete(first).unwrap();

        assert_eq!(service.create("c", "d").unwrap().id, first + 1);
    }

    #[test]
    fn test_overflowing_adjust_leaves_record_unchanged() {
        let (_dir, service) = service();
        let id = service.create("a", "b").unwrap().id;
        service.adjust_balance(id, i64::MAX).unwrap();

        assert!(matches!(
            service.adjust_balance(id, 1),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert_eq!(service.get(id).unwrap().balance, i64::MAX);
    }

    #[test]
    fn test_failed_allocation_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let service = AccountService::new(FailingAllocator, RecordStore::new(dir.path()));

        assert!(matches!(
            service.create("a", "b"),
            Err(LedgerError::Storage { .. })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_lookups_that_miss_leave_no_lock_entries() {
        let (_dir, service) = service();

        for id in 1..=1_000 {
            assert!(service.get(id).is_err());
            assert!(service.adjust_balance(id, 1).is_err());
            assert!(service.delete(id).is_err());
        }

        assert_eq!(service.locks.len(), 0);
    }

    #[test]
    fn test_lock_entries_released_after_operations() {
        let (_dir, service) = service();
        let id = service.create("a", "b").unwrap().id;
        service.adjust_balance(id, 10).unwrap();
        service.get(id).unwrap();
        service.delete(id).unwrap();

        assert_eq!(service.locks.len(), 0);
    }

    #[test]
    fn test_failed_save_consumes_id() {
        let (dir, service) = service();
        std::fs::create_dir(dir.path().join("1.json")).unwrap();

        assert!(matches!(
            service.create("a", "b"),
            Err(LedgerError::Storage { .. })
        ));
        assert_eq!(service.last_issued_id().unwrap(), 1);
        assert_eq!(service.create("c", "d").unwrap().id, 2);
    }

    #[test]
    fn test_concurrent_adjustments_are_not_lost() {
        let (_dir, service) = service();
        let service = Arc::new(service);
        let id = service.create("a", "b").unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    for _ in 0..20 {
                        service.adjust_balance(id, 5).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(service.get(id).unwrap().balance, 8 * 20 * 5);
        assert_eq!(service.locks.len(), 0);
    }
}
