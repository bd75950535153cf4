pub mod constants;
pub mod errors;
pub mod handle_registry;
pub mod helpers;
pub mod public_api;
pub mod router;
pub mod snapshot;
pub mod telemetry;
pub mod types;

pub use crate::errors::{Error, ErrorCode};
pub use crate::router::Router;
pub use crate::snapshot::{OwnedMatch, SharedRouter};
pub use crate::types::{Match, Node, NodeKind, Param, Params, RadixTree, TreeConfig};

use constants::*;
use helpers::*;
use log::{debug, trace, warn};
use metrics::{counter, gauge};
use once_cell::sync::OnceCell;
use std::mem;

impl<H> Default for RadixTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RadixTree<H> {
    // First tree in the process installs env_logger unless the host already set a logger.
    fn ensure_logging() {
        static INIT: OnceCell<()> = OnceCell::new();
        INIT.get_or_init(|| {
            let _ = env_logger::builder()
                .format_timestamp(None)
                .is_test(std::env::var("RUST_TEST_THREADS").is_ok())
                .try_init();
        });
    }

    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self::ensure_logging();
        Self {
            root: Node::new(NodeKind::Root),
            config,
            routes: 0,
            max_params: 0,
        }
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    pub fn root(&self) -> &Node<H> {
        &self.root
    }

    /// Register `pattern` against `handle`.
    ///
    /// The pattern is validated and probed against the current tree before
    /// anything is mutated, so a rejected registration leaves the tree exactly
    /// as it was and further routes can still be added.
    pub fn add_route(&mut self, pattern: &str, handle: H) -> Result<(), Error> {
        debug!("[INSERT] pattern={:?}", pattern);
        if let Err(e) = self.check_route(pattern) {
            warn!("[INSERT] rejected {:?}: {}", pattern, e);
            counter!(METRIC_ROUTE_ERRORS_TOTAL).increment(1);
            return Err(e);
        }

        let num_wildcards = count_wildcards(pattern);
        self.root.priority += 1;
        if self.root.is_vacant() {
            trace!("[INSERT] Empty tree, pattern becomes the root.");
            self.root.insert_child(pattern, 0, handle);
            self.root.kind = NodeKind::Root;
        } else {
            self.root.merge(pattern, 0, handle);
        }

        self.routes += 1;
        self.max_params = self.max_params.max(num_wildcards);
        counter!(METRIC_ROUTES_TOTAL).increment(1);
        gauge!(METRIC_ROUTES).set(self.routes as f64);
        debug!("[INSERT] Finished {:?} (routes={}).", pattern, self.routes);
        Ok(())
    }

    /// Dry run of `add_route`: reports the error the registration would raise.
    pub fn check_route(&self, pattern: &str) -> Result<(), Error> {
        validate_pattern(pattern)?;
        if self.root.is_vacant() {
            return Ok(());
        }
        self.root.probe(pattern, 0, self.config.strict_wildcards)
    }

    /// Resolve `path` to a handle and its parameters.
    ///
    /// Static children are preferred; when a static descent dead-ends the walk
    /// resumes at the most recent wildcard child it bypassed.
    pub fn search<'a>(&'a self, path: &'a str) -> Match<'a, H> {
        counter!(METRIC_LOOKUPS_TOTAL).increment(1);
        let found = self.walk(path);
        if found.handle.is_none() {
            trace!("[SEARCH] no route for {:?}", path);
            counter!(METRIC_LOOKUP_MISSES_TOTAL).increment(1);
        }
        found
    }

    /// Lookup without touching the lookup counters.
    pub(crate) fn walk<'a>(&'a self, path: &'a str) -> Match<'a, H> {
        let bytes = path.as_bytes();
        let mut params = Params::with_capacity(self.max_params.max(DEFAULT_PARAM_CAPACITY));
        // (wildcard node, path offset, params recorded so far)
        let mut skipped: Vec<(&'a Node<H>, usize, usize)> = Vec::new();
        let mut node = &self.root;
        let mut pos = 0usize;

        'walk: loop {
            match node.kind {
                NodeKind::Root | NodeKind::Static => {
                    let rest = &bytes[pos..];
                    let seg = node.segment.as_slice();
                    if rest.len() > seg.len() && rest.starts_with(seg) {
                        pos += seg.len();
                        if let Some(i) = node.child_index(bytes[pos]) {
                            if let Some(wild) = node.wildcard.as_deref() {
                                skipped.push((wild, pos, params.len()));
                            }
                            node = &node.children[i];
                            continue 'walk;
                        }
                        if let Some(wild) = node.wildcard.as_deref() {
                            node = wild;
                            continue 'walk;
                        }
                    } else if rest == seg {
                        if let Some(handle) = node.handle.as_ref() {
                            return Match {
                                handle: Some(handle),
                                params,
                            };
                        }
                    }
                }
                NodeKind::Param => {
                    let end = segment_end(bytes, pos);
                    if end > pos {
                        params.push(&node.key, &path[pos..end]);
                        if end == bytes.len() {
                            if let Some(handle) = node.handle.as_ref() {
                                return Match {
                                    handle: Some(handle),
                                    params,
                                };
                            }
                        } else if let Some(i) = node.child_index(bytes[end]) {
                            node = &node.children[i];
                            pos = end;
                            continue 'walk;
                        }
                    }
                }
                NodeKind::CatchAll => {
                    // needs at least one byte; the bare directory belongs to the parent
                    if pos < bytes.len() {
                        if let Some(handle) = node.handle.as_ref() {
                            params.push(&node.key, &path[pos..]);
                            return Match {
                                handle: Some(handle),
                                params,
                            };
                        }
                    }
                }
            }

            // Dead end: retry the latest wildcard a static child shadowed.
            match skipped.pop() {
                Some((wild, at, recorded)) => {
                    trace!("[SEARCH] backtracking to {:?} at {}", wild.key, at);
                    params.truncate(recorded);
                    node = wild;
                    pos = at;
                }
                None => return Match::miss(),
            }
        }
    }
}

impl<H> Node<H> {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            segment: Vec::new(),
            kind,
            key: Box::default(),
            indices: Vec::new(),
            children: Vec::new(),
            wildcard: None,
            handle: None,
            priority: 0,
        }
    }

    fn wildcard_node(kind: NodeKind, segment: &[u8], key: &str) -> Self {
        Self {
            segment: segment.to_vec(),
            key: key.into(),
            priority: 1,
            ..Self::new(kind)
        }
    }

    pub fn segment(&self) -> &[u8] {
        &self.segment
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Declared parameter name of a Param/CatchAll node; empty otherwise.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn children(&self) -> &[Node<H>] {
        &self.children
    }

    pub fn wildcard_child(&self) -> Option<&Node<H>> {
        self.wildcard.as_deref()
    }

    pub fn has_wildcard_child(&self) -> bool {
        self.wildcard.is_some()
    }

    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    #[inline]
    fn child_index(&self, b: u8) -> Option<usize> {
        self.indices.iter().position(|&c| c == b)
    }

    fn is_vacant(&self) -> bool {
        self.segment.is_empty()
            && self.children.is_empty()
            && self.wildcard.is_none()
            && self.handle.is_none()
    }

    /// Cut the segment at `i`; the tail and everything hanging off this node
    /// move into a single static child.
    fn split(&mut self, i: usize) {
        trace!(
            "[SPLIT] {:?} at {}",
            String::from_utf8_lossy(&self.segment),
            i
        );
        let tail = self.segment.split_off(i);
        let first = tail[0];
        let child = Node {
            segment: tail,
            kind: NodeKind::Static,
            key: Box::default(),
            indices: mem::take(&mut self.indices),
            children: mem::take(&mut self.children),
            wildcard: self.wildcard.take(),
            handle: self.handle.take(),
            priority: self.priority.saturating_sub(1),
        };
        self.indices = vec![first];
        self.children = vec![child];
    }

    /// Increment the priority of child `pos` and move it towards the front
    /// past every sibling with a strictly lower priority. Returns its new index.
    fn bump_priority(&mut self, pos: usize) -> usize {
        self.children[pos].priority += 1;
        let prio = self.children[pos].priority;

        let mut new_pos = pos;
        while new_pos > 0 && self.children[new_pos - 1].priority < prio {
            self.children.swap(new_pos - 1, new_pos);
            new_pos -= 1;
        }
        if new_pos != pos {
            self.indices[new_pos..=pos].rotate_right(1);
        }
        new_pos
    }

    /// Read-only mirror of `merge`: walks the tree as the insertion would and
    /// reports the first structural conflict.
    fn probe(&self, pattern: &str, off: usize, strict: bool) -> Result<(), Error> {
        let path = &pattern.as_bytes()[off..];
        let i = common_prefix_len(&self.segment, path);

        if i < self.segment.len() {
            // After the split this node holds only the old tail as a static child.
            if strict && i < path.len() && is_wildcard(path[i]) {
                return Err(blocked(pattern, off + i));
            }
            return Ok(());
        }

        if i == path.len() {
            return match self.handle {
                Some(_) => Err(Error::DuplicateRoute {
                    pattern: pattern.to_owned(),
                }),
                None => Ok(()),
            };
        }

        let off = off + i;
        let rest = &path[i..];
        let first = rest[0];
        if let Some(pos) = self.child_index(first) {
            return self.children[pos].probe(pattern, off, strict);
        }

        match self.wildcard.as_deref() {
            Some(wild) if is_wildcard(first) => {
                if !wildcard_compatible(&wild.segment, rest) {
                    return Err(wild.conflict(pattern, off));
                }
                wild.probe(pattern, off, strict)
            }
            None if is_wildcard(first) && strict && !self.children.is_empty() => {
                Err(blocked(pattern, off))
            }
            Some(wild) if strict => Err(wild.conflict(pattern, off)),
            _ => Ok(()),
        }
    }

    /// Edge merge. Callers must have run `probe` on the same pattern.
    fn merge(&mut self, pattern: &str, off: usize, handle: H) {
        let path = &pattern.as_bytes()[off..];
        let i = common_prefix_len(&self.segment, path);

        if i < self.segment.len() {
            self.split(i);
        }

        if i == path.len() {
            debug_assert!(self.handle.is_none(), "invalid node state: duplicate handle");
            self.handle = Some(handle);
            return;
        }

        let off = off + i;
        let first = path[i];
        if let Some(pos) = self.child_index(first) {
            let pos = self.bump_priority(pos);
            self.children[pos].merge(pattern, off, handle);
            return;
        }

        if is_wildcard(first) {
            match self.wildcard.as_deref_mut() {
                Some(wild) => {
                    wild.priority += 1;
                    wild.merge(pattern, off, handle);
                }
                None => self.insert_child(pattern, off, handle),
            }
            return;
        }

        debug_assert!(
            self.kind != NodeKind::CatchAll,
            "invalid node state: catch-all cannot have children"
        );
        self.indices.push(first);
        self.children.push(Node::new(NodeKind::Static));
        let pos = self.bump_priority(self.children.len() - 1);
        self.children[pos].insert_child(pattern, off, handle);
    }

    /// Leaf insertion of `pattern[off..]` into a fresh node (or, when the
    /// fragment starts with a wildcard, below an existing one).
    fn insert_child(&mut self, pattern: &str, off: usize, handle: H) {
        let path = &pattern.as_bytes()[off..];
        let Some((start, end)) = find_wildcard(path) else {
            self.segment = path.to_vec();
            self.handle = Some(handle);
            return;
        };

        if start > 0 {
            self.segment = path[..start].to_vec();
        }
        let key = &pattern[off + start + 1..off + end];
        let token = &path[start..end];

        if path[start] == CATCH_ALL_MARKER {
            trace!("[INSERT] catch-all {:?}", key);
            let mut child = Node::wildcard_node(NodeKind::CatchAll, token, key);
            child.handle = Some(handle);
            self.wildcard = Some(Box::new(child));
            return;
        }

        trace!("[INSERT] param {:?}", key);
        let mut child = Node::wildcard_node(NodeKind::Param, token, key);
        if end < path.len() {
            let mut next = Node::new(NodeKind::Static);
            next.priority = 1;
            next.insert_child(pattern, off + end, handle);
            child.indices.push(SEPARATOR);
            child.children.push(next);
        } else {
            child.handle = Some(handle);
        }
        self.wildcard = Some(Box::new(child));
    }

    fn conflict(&self, pattern: &str, off: usize) -> Error {
        let bytes = pattern.as_bytes();
        let rest = &bytes[off..];
        let segment = match self.kind {
            NodeKind::CatchAll => rest,
            _ => &rest[..segment_end(rest, 0)],
        };
        let existing = lossy(&self.segment);
        Error::WildcardConflict {
            pattern: pattern.to_owned(),
            segment: lossy(segment),
            prefix: lossy(&bytes[..off]) + &existing,
            existing,
        }
    }
}

// An existing wildcard token accepts `rest` only if `rest` repeats it up to a
// segment boundary.
fn wildcard_compatible(existing: &[u8], rest: &[u8]) -> bool {
    rest.starts_with(existing) && (rest.len() == existing.len() || rest[existing.len()] == SEPARATOR)
}

fn blocked(pattern: &str, off: usize) -> Error {
    let bytes = pattern.as_bytes();
    Error::WildcardBlockedByChildren {
        pattern: pattern.to_owned(),
        wildcard: lossy(&bytes[off..segment_end(bytes, off)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[&str]) -> RadixTree<usize> {
        let mut t = RadixTree::new();
        for (i, r) in routes.iter().enumerate() {
            t.add_route(r, i).unwrap();
        }
        t
    }

    #[test]
    fn split_moves_tail_into_child() {
        let t = tree(&["/users", "/usr"]);
        let root = t.root();
        assert_eq!(root.segment(), b"/us");
        assert_eq!(root.kind(), NodeKind::Root);
        assert!(root.handle().is_none());
        assert_eq!(root.indices(), b"er");
        assert_eq!(root.children()[0].segment(), b"ers");
        assert_eq!(root.children()[0].handle(), Some(&0));
        assert_eq!(root.children()[1].segment(), b"r");
        assert_eq!(root.priority(), 2);
    }

    #[test]
    fn bump_priority_keeps_indices_in_lockstep() {
        let t = tree(&["/a", "/b", "/bb", "/bc", "/cx"]);
        let root = t.root();
        assert_eq!(root.segment(), b"/");
        for (i, child) in root.children().iter().enumerate() {
            assert_eq!(root.indices()[i], child.segment()[0]);
        }
        // "/b" carries three routes and moves to the front
        assert_eq!(root.indices()[0], b'b');
        assert_eq!(root.children()[0].priority(), 3);
        let prios: Vec<u32> = root.children().iter().map(|c| c.priority()).collect();
        assert!(prios.windows(2).all(|w| w[0] >= w[1]), "{prios:?}");
    }

    #[test]
    fn param_chain_layout() {
        let t = tree(&["/users/:id/posts"]);
        let root = t.root();
        assert_eq!(root.segment(), b"/users/");
        let param = root.wildcard_child().unwrap();
        assert_eq!(param.kind(), NodeKind::Param);
        assert_eq!(param.key(), "id");
        assert_eq!(param.indices(), b"/");
        assert_eq!(param.children()[0].segment(), b"/posts");
        assert_eq!(param.children()[0].handle(), Some(&0));
    }

    #[test]
    fn catch_all_hangs_below_slash() {
        let t = tree(&["/files/*path"]);
        assert_eq!(t.root().segment(), b"/files/");
        let ca = t.root().wildcard_child().unwrap();
        assert_eq!(ca.kind(), NodeKind::CatchAll);
        assert_eq!(ca.key(), "path");
        assert!(ca.children().is_empty());
        assert_eq!(ca.handle(), Some(&0));
    }

    #[test]
    fn split_keeps_wildcard_state_on_tail() {
        let t = tree(&["/users/:id", "/usr"]);
        let root = t.root();
        assert!(!root.has_wildcard_child());
        let users = &root.children()[0];
        assert_eq!(users.segment(), b"ers/");
        assert!(users.has_wildcard_child());
    }

    #[test]
    fn rejected_insert_leaves_tree_untouched() {
        let mut t = tree(&["/users/:id", "/about"]);
        let before = format!("{t:?}");
        assert!(t.add_route("/users/:name/x", 9).is_err());
        assert!(t.add_route("/about", 9).is_err());
        assert!(t.add_route("/ab/*rest/more", 9).is_err());
        assert_eq!(format!("{t:?}"), before);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn strict_mode_keeps_wildcards_exclusive() {
        let mut t = RadixTree::with_config(TreeConfig {
            strict_wildcards: true,
        });
        t.add_route("/users/me", 0).unwrap();
        let before = format!("{t:?}");
        assert!(matches!(
            t.add_route("/users/:id", 1),
            Err(Error::WildcardBlockedByChildren { wildcard, .. }) if wildcard == ":id"
        ));
        assert_eq!(format!("{t:?}"), before);

        let mut t = RadixTree::with_config(TreeConfig {
            strict_wildcards: true,
        });
        t.add_route("/users/:id", 0).unwrap();
        assert!(matches!(
            t.add_route("/users/me", 1),
            Err(Error::WildcardConflict { .. })
        ));
    }

    #[test]
    fn wildcard_conflict_message() {
        let mut t = tree(&["/users/:id/posts"]);
        let err = t.add_route("/users/:name", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "':name' in new path '/users/:name' conflicts with existing wildcard ':id' in existing prefix '/users/:id'"
        );
    }

    #[test]
    fn empty_pattern_is_not_overwritten() {
        let t = tree(&["", "/a"]);
        assert_eq!(t.search("").handle, Some(&0));
        assert_eq!(t.search("/a").handle, Some(&1));
    }
}
