//! Copy-on-write router snapshots for registering routes while serving.
//!
//! Readers grab the current `Arc<Router<H>>` without locking. Writers are
//! serialised, register into a private clone and publish it with one atomic
//! swap, so a search never observes a half-built tree and a rejected
//! registration publishes nothing.

use crate::errors::Error;
use crate::router::Router;
use crate::types::TreeConfig;
use arc_swap::ArcSwap;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Lookup result detached from the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedMatch<H> {
    pub handle: H,
    pub params: Vec<(String, String)>,
}

pub struct SharedRouter<H> {
    snapshot: ArcSwap<Router<H>>,
    writer: Mutex<()>,
    version: AtomicU64,
}

impl<H: Clone> Default for SharedRouter<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone> SharedRouter<H> {
    pub fn new() -> Self {
        Self::from_router(Router::new())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::from_router(Router::with_config(config))
    }

    /// Publish an already built router as the first snapshot.
    pub fn from_router(router: Router<H>) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(router),
            writer: Mutex::new(()),
            version: AtomicU64::new(0),
        }
    }

    /// Current snapshot; stays valid (and unchanged) for as long as it is held.
    pub fn load(&self) -> Arc<Router<H>> {
        self.snapshot.load_full()
    }

    /// Number of snapshots published since construction.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn add_route(&self, method: &str, pattern: &str, handle: H) -> Result<(), Error> {
        self.add_routes([(method, pattern, handle)])
    }

    /// Register a batch as one snapshot: either every route is published or none.
    pub fn add_routes<'r, I>(&self, routes: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (&'r str, &'r str, H)>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = (**self.snapshot.load()).clone();
        for (method, pattern, handle) in routes {
            next.add_route(method, pattern, handle)?;
        }
        self.snapshot.store(Arc::new(next));
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("[SNAPSHOT] published version {}", version);
        Ok(())
    }

    pub fn lookup(&self, method: &str, path: &str) -> Option<OwnedMatch<H>> {
        let snapshot = self.snapshot.load();
        let found = snapshot.search(method, path);
        found.handle.map(|handle| OwnedMatch {
            handle: handle.clone(),
            params: found.params.to_pairs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_snapshot_is_stable() {
        let shared = SharedRouter::new();
        shared.add_route("GET", "/a", 1u32).unwrap();
        let old = shared.load();
        shared.add_route("GET", "/b", 2).unwrap();

        assert!(old.search("GET", "/b").handle.is_none());
        assert_eq!(shared.load().search("GET", "/b").handle, Some(&2));
        assert_eq!(shared.version(), 2);
    }

    #[test]
    fn failed_batch_publishes_nothing() {
        let shared = SharedRouter::new();
        shared.add_route("GET", "/users/:id", 1u32).unwrap();
        let err = shared.add_routes([("GET", "/ok", 2), ("GET", "/users/:name", 3)]);
        assert!(matches!(err, Err(Error::WildcardConflict { .. })));
        assert_eq!(shared.version(), 1);
        assert!(shared.lookup("GET", "/ok").is_none());
    }

    #[test]
    fn lookup_owns_its_params() {
        let shared = SharedRouter::new();
        shared.add_route("GET", "/files/*path", "files").unwrap();
        let m = shared.lookup("GET", "/files/a/b").unwrap();
        assert_eq!(m.handle, "files");
        assert_eq!(m.params, vec![("path".to_string(), "a/b".to_string())]);
    }
}
