//! Data structures for the radix tree

use std::fmt;

/// Node kind; `Root` only ever tags the tree's entry node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Static,
    Param,
    CatchAll,
}

/// Tree behaviour knobs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Reject static routes and wildcards sharing a position (`/users/me` next to
    /// `/users/:id`). When false, static children win and lookup falls back to the
    /// wildcard.
    pub strict_wildcards: bool,
}

/// Node in the radix tree
#[derive(Clone)]
pub struct Node<H> {
    pub(crate) segment: Vec<u8>, // literal bytes this node owns
    pub(crate) kind: NodeKind,
    pub(crate) key: Box<str>,     // declared name, Param/CatchAll only
    pub(crate) indices: Vec<u8>,  // first byte of each static child
    pub(crate) children: Vec<Node<H>>, // static children, lockstep with `indices`
    pub(crate) wildcard: Option<Box<Node<H>>>,
    pub(crate) handle: Option<H>,
    pub(crate) priority: u32, // routes passing through this node
}

/// RadixTree struct (core handle)
#[derive(Clone)]
pub struct RadixTree<H> {
    pub(crate) root: Node<H>,
    pub(crate) config: TreeConfig,
    pub(crate) routes: usize,
    pub(crate) max_params: usize, // widest wildcard count seen so far
}

/// One extracted path parameter, borrowing its key from the tree and its
/// value from the searched path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Param<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Parameters in the order their wildcards appear in the registered pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a> {
    pub(crate) inner: Vec<Param<'a>>,
}

impl<'a> Params<'a> {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            inner: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, key: &'a str, value: &'a str) {
        self.inner.push(Param { key, value });
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.inner.iter().find(|p| p.key == key).map(|p| p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param<'a>> + '_ {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_slice(&self) -> &[Param<'a>] {
        &self.inner
    }

    /// Owned `(key, value)` pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.inner
            .iter()
            .map(|p| (p.key.to_owned(), p.value.to_owned()))
            .collect()
    }
}

impl<'a> IntoIterator for Params<'a> {
    type Item = Param<'a>;
    type IntoIter = std::vec::IntoIter<Param<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Lookup result. `handle == None` means no route matched; it is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'a, H> {
    pub handle: Option<&'a H>,
    pub params: Params<'a>,
}

impl<'a, H> Match<'a, H> {
    pub(crate) fn miss() -> Self {
        Self {
            handle: None,
            params: Params::default(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.handle.is_some()
    }
}

impl<H> fmt::Debug for Node<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("segment", &String::from_utf8_lossy(&self.segment))
            .field("kind", &self.kind)
            .field("indices", &String::from_utf8_lossy(&self.indices))
            .field("priority", &self.priority)
            .field("has_handle", &self.handle.is_some())
            .field("children", &self.children)
            .field("wildcard", &self.wildcard)
            .finish()
    }
}

impl<H> fmt::Debug for RadixTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadixTree")
            .field("config", &self.config)
            .field("routes", &self.routes)
            .field("root", &self.root)
            .finish()
    }
}
