//! Path-keyed memoization for any [`TableLoader`].
//!
//! Entries live for the lifetime of the loader and are never invalidated.
//! Failed loads are not cached, so a file that appears later is picked up
//! on the next call.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{LoadError, Table, TableLoader};

/// A [`TableLoader`] that remembers every table it has loaded.
pub struct CachedLoader<L> {
    inner: L,
    tables: Mutex<BTreeMap<PathBuf, Arc<Table>>>,
}

impl<L: TableLoader> CachedLoader<L> {
    /// Wraps `inner` with an empty cache.
    #[must_use]
    pub const fn new(inner: L) -> Self {
        Self {
            inner,
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of cached tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether `path` has a cached table.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Arc<Table>>> {
        // The map is only ever inserted into, so a poisoned guard is still
        // consistent.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: TableLoader> TableLoader for CachedLoader<L> {
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError> {
        if let Some(table) = self.lock().get(path) {
            log::trace!("Cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }

        // Load outside the lock; a concurrent miss on the same path may read
        // the file twice but the first insert wins.
        let table = self.inner.load(path)?;
        let mut tables = self.lock();
        let cached = tables.entry(path.to_path_buf()).or_insert(table);
        Ok(Arc::clone(cached))
    }
}
