//! Per-method routing table.
//!
//! Every method key owns an independent [`RadixTree`]. Method keys are opaque:
//! they are compared byte for byte and never parsed or case-folded.

use crate::errors::Error;
use crate::types::{Match, RadixTree, TreeConfig};
use log::debug;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct Router<H> {
    trees: HashMap<String, RadixTree<H>>,
    config: TreeConfig,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// All trees created by this router share `config`.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            trees: HashMap::new(),
            config,
        }
    }

    pub fn add_route(&mut self, method: &str, pattern: &str, handle: H) -> Result<(), Error> {
        if let Some(tree) = self.trees.get_mut(method) {
            return tree.add_route(pattern, handle);
        }
        // a method only gets a tree once it holds a route
        let mut tree = RadixTree::with_config(self.config);
        tree.add_route(pattern, handle)?;
        debug!("[ROUTER] new tree for method {:?}", method);
        self.trees.insert(method.to_owned(), tree);
        Ok(())
    }

    /// No-match when the method has no tree at all.
    pub fn search<'a>(&'a self, method: &str, path: &'a str) -> Match<'a, H> {
        match self.trees.get(method) {
            Some(tree) => tree.search(path),
            None => Match::miss(),
        }
    }

    /// Methods with a route matching `path`, sorted; feeds `405 Allow` headers.
    pub fn allowed_methods(&self, path: &str) -> Vec<&str> {
        let mut methods: Vec<&str> = self
            .trees
            .iter()
            .filter(|(_, tree)| tree.walk(path).is_match())
            .map(|(m, _)| m.as_str())
            .collect();
        methods.sort_unstable();
        methods
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> + '_ {
        self.trees.keys().map(String::as_str)
    }

    pub fn tree(&self, method: &str) -> Option<&RadixTree<H>> {
        self.trees.get(method)
    }

    /// Routes across every method.
    pub fn len(&self) -> usize {
        self.trees.values().map(RadixTree::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
