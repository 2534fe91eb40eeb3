//! Shared application state for the payroll API.

use std::sync::{Arc, RwLock};

use crate::config::ConstantsStore;
use crate::store::MemoryStore;

/// Application state shared across all request handlers.
///
/// Constants are read-mostly: computations take a read lock, parametric
/// updates take the exclusive write lock and later computations open
/// fresh caching views.
#[derive(Clone)]
pub struct AppState {
    store: Arc<MemoryStore>,
    constants: Arc<RwLock<ConstantsStore>>,
}

impl AppState {
    /// Creates state from a store and loaded constants.
    pub fn new(store: Arc<MemoryStore>, constants: ConstantsStore) -> Self {
        Self {
            store,
            constants: Arc::new(RwLock::new(constants)),
        }
    }

    /// The transactional store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Runs a closure against the constants store under the read lock.
    pub fn with_constants<T>(&self, f: impl FnOnce(&ConstantsStore) -> T) -> T {
        f(&self.constants.read().expect("constants lock poisoned"))
    }

    /// Runs a closure against the constants store under the exclusive
    /// write lock.
    pub fn update_constants<T>(&self, f: impl FnOnce(&mut ConstantsStore) -> T) -> T {
        f(&mut self.constants.write().expect("constants lock poisoned"))
    }
}
