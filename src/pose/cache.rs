use super::backend::Library;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static GLOBAL_CACHE: OnceLock<Arc<LibraryCache>> = OnceLock::new();

/// Records which pose libraries have already been fetched in this process.
///
/// Created once per process and never torn down; `reset` exists so
/// independent test runs can start clean.
#[derive(Debug, Default)]
pub struct LibraryCache {
    loaded: Mutex<HashSet<Library>>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance
    pub fn global() -> Arc<LibraryCache> {
        Arc::clone(GLOBAL_CACHE.get_or_init(|| Arc::new(LibraryCache::new())))
    }

    pub fn contains(&self, library: Library) -> bool {
        self.loaded.lock().contains(&library)
    }

    pub fn mark_loaded(&self, library: Library) {
        if self.loaded.lock().insert(library) {
            debug!("{:?} recorded in library cache", library);
        }
    }

    pub fn reset(&self) {
        self.loaded.lock().clear();
    }
}
