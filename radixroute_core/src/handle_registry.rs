use crate::{errors::ErrorCode, RadixTree};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle ID type - safer than raw pointers
pub type TreeId = u64;

/// Trees handed out over the C ABI carry plain integer route handles.
pub type FfiTree = RadixTree<u64>;

static REGISTRY: Lazy<DashMap<TreeId, FfiTree>> = Lazy::new(DashMap::new);
static NEXT_ID: AtomicU64 = AtomicU64::new(1); // reserve 0 for null/invalid

/// Register a new tree and return its handle ID
pub fn register_handle(tree: FfiTree) -> TreeId {
    let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    REGISTRY.insert(id, tree);
    id
}

/// Execute a function with a shared reference to the tree identified by `id`
pub fn with_handle<T, F>(id: TreeId, f: F) -> Result<T, ErrorCode>
where
    F: FnOnce(&FfiTree) -> T,
{
    REGISTRY
        .get(&id)
        .map(|tree| f(tree.value()))
        .ok_or(ErrorCode::InvalidHandle)
}

/// Execute a function with an exclusive reference to the tree identified by `id`
pub fn with_handle_mut<T, F>(id: TreeId, f: F) -> Result<T, ErrorCode>
where
    F: FnOnce(&mut FfiTree) -> T,
{
    REGISTRY
        .get_mut(&id)
        .map(|mut tree| f(tree.value_mut()))
        .ok_or(ErrorCode::InvalidHandle)
}

/// Unregister and drop a tree
pub fn unregister_handle(id: TreeId) -> Result<(), ErrorCode> {
    REGISTRY
        .remove(&id)
        .map(|_| ())
        .ok_or(ErrorCode::InvalidHandle)
}
