//! Per-path write leases.
//!
//! A lease is held for the whole read-modify-write cycle of a file. While it
//! is held, change events for that path are dropped by the watcher (the cycle
//! is writing the file itself), and any other cycle for the same path waits.
//! A path's slot is removed when its last lease or waiter goes away.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>;

/// Registry of per-path leases.
#[derive(Debug, Default)]
pub struct WriteLeases {
    slots: Slots,
}

/// Exclusive right to run a cycle on one path. Released on drop.
#[derive(Debug)]
pub struct WriteLease {
    path: PathBuf,
    slots: Slots,
    guard: Option<OwnedMutexGuard<()>>,
}

impl WriteLease {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriteLease {
    fn drop(&mut self) {
        // The guard owns a reference to the slot, so release it before counting.
        drop(self.guard.take());
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(&self.path)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.path);
        }
    }
}

impl WriteLeases {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, path: &Path) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(path.to_path_buf()).or_default())
    }

    /// Wait until no other cycle holds `path`, then take the lease.
    pub async fn acquire(&self, path: &Path) -> WriteLease {
        let guard = self.slot(path).lock_owned().await;
        tracing::debug!(path = %path.display(), "Acquired write lease");
        WriteLease {
            path: path.to_path_buf(),
            slots: Arc::clone(&self.slots),
            guard: Some(guard),
        }
    }

    /// Whether a cycle currently holds (or is being handed) the lease for `path`.
    #[must_use]
    pub fn is_held(&self, path: &Path) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(path)
            .is_some_and(|slot| slot.try_lock().is_err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lease_marks_path_held_until_dropped() {
        let leases = WriteLeases::new();
        let path = Path::new("/work/top.v");

        assert!(!leases.is_held(path));
        let lease = leases.acquire(path).await;
        assert_eq!(lease.path(), path);
        assert!(leases.is_held(path));
        assert!(!leases.is_held(Path::new("/work/other.v")));

        drop(lease);
        assert!(!leases.is_held(path));
    }

    #[tokio::test]
    async fn test_second_acquire_waits_for_release() {
        let leases = Arc::new(WriteLeases::new());
        let path = PathBuf::from("/work/top.v");

        let first = leases.acquire(&path).await;

        let waiter = {
            let leases = Arc::clone(&leases);
            let path = path.clone();
            tokio::spawn(async move {
                let _second = leases.acquire(&path).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_paths_do_not_block() {
        let leases = WriteLeases::new();
        let _a = leases.acquire(Path::new("/work/a.v")).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            leases.acquire(Path::new("/work/b.v")),
        )
        .await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_slot_is_removed() {
        let leases = WriteLeases::new();
        for i in 0..10 {
            let _lease = leases.acquire(&PathBuf::from(format!("/work/f{i}.v"))).await;
        }
        assert!(leases.slots.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slot_kept_while_waiter_queued() {
        let leases = Arc::new(WriteLeases::new());
        let path = PathBuf::from("/work/top.v");
        let first = leases.acquire(&path).await;

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let waiter = {
            let leases = Arc::clone(&leases);
            let path = path.clone();
            tokio::spawn(async move {
                let _second = leases.acquire(&path).await;
                let _ = rx.await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The waiter now holds the lease on the same slot.
        assert!(leases.is_held(&path));

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(!leases.is_held(&path));
        assert!(leases.slots.lock().unwrap().is_empty());
    }
}
