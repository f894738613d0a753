//! Prefix tree of weakly-held canonical values.
//!
//! Values are addressed by a sequence of key segments. Each node owns its
//! children but only a [`Weak`] to its payload, so the trie never keeps a
//! canonical value alive on its own. A payload whose last strong handle was
//! dropped reads as absent and is rebuilt on the next lookup of that path;
//! descendants of the node are left untouched since they may still be live
//! for longer paths.
//!
//! There is no remove operation. Lifetime is driven entirely by the strong
//! handles callers hold. [`WeakRefTrie::prune`] exists to reclaim node memory
//! for dead branches but is never needed for correctness.
//!
//! The trie does no locking of its own; shared users wrap it in a mutex.

use std::hash::Hash;
use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;

/// One segment of a key path.
struct TrieNode<S, T> {
    children: FxHashMap<S, TrieNode<S, T>>,
    /// Set only on nodes that terminate a complete path.
    payload: Option<Weak<T>>,
}

impl<S, T> Default for TrieNode<S, T> {
    fn default() -> Self {
        TrieNode {
            children: FxHashMap::default(),
            payload: None,
        }
    }
}

impl<S, T> TrieNode<S, T> {
    fn live_payload(&self) -> Option<Arc<T>> {
        self.payload.as_ref().and_then(Weak::upgrade)
    }

    /// Drop dead subtrees below this node. Returns the number of nodes removed
    /// and whether this node still holds anything live.
    fn prune(&mut self) -> (usize, bool) {
        let mut removed = 0;
        self.children.retain(|_, child| {
            let (child_removed, child_live) = child.prune();
            removed += child_removed;
            if !child_live {
                removed += 1;
            }
            child_live
        });

        if self.payload.as_ref().is_some_and(|w| w.strong_count() == 0) {
            self.payload = None;
        }

        let live = self.payload.is_some() || !self.children.is_empty();
        (removed, live)
    }

    fn count(&self, nodes: &mut usize, live: &mut usize) {
        for child in self.children.values() {
            *nodes += 1;
            if child.payload.as_ref().is_some_and(|w| w.strong_count() > 0) {
                *live += 1;
            }
            child.count(nodes, live);
        }
    }
}

/// Weak-valued prefix tree keyed by segment sequences.
pub struct WeakRefTrie<S, T> {
    root: TrieNode<S, T>,
}

impl<S, T> Default for WeakRefTrie<S, T> {
    fn default() -> Self {
        WeakRefTrie {
            root: TrieNode::default(),
        }
    }
}

impl<S: Eq + Hash, T> WeakRefTrie<S, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the live value stored at `path`, or build one with `reconstruct`.
    ///
    /// Missing nodes along the path are created. When the terminal slot is
    /// empty or its value has been collected, `reconstruct` runs and its result
    /// is stored weakly before being returned. A failing `reconstruct` leaves
    /// the slot as it was.
    pub fn lookup_or_insert<E>(
        &mut self,
        path: impl IntoIterator<Item = S>,
        reconstruct: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let mut node = &mut self.root;
        for segment in path {
            node = node.children.entry(segment).or_default();
        }

        if let Some(live) = node.live_payload() {
            return Ok(live);
        }

        if node.payload.is_some() {
            tracing::trace!("trie payload was collected, rebuilding");
        }

        let value = Arc::new(reconstruct()?);
        node.payload = Some(Arc::downgrade(&value));
        Ok(value)
    }

    /// Probe for a live value without creating nodes.
    pub fn get<'a>(&self, path: impl IntoIterator<Item = &'a S>) -> Option<Arc<T>>
    where
        S: 'a,
    {
        let mut node = &self.root;
        for segment in path {
            node = node.children.get(segment)?;
        }
        node.live_payload()
    }

    /// Remove every subtree that no longer holds a live value.
    ///
    /// Returns the number of nodes removed.
    pub fn prune(&mut self) -> usize {
        let (removed, _) = self.root.prune();
        if removed > 0 {
            tracing::debug!(removed, "pruned dead trie branches");
        }
        removed
    }

    /// Number of nodes below the root.
    pub fn node_count(&self) -> usize {
        let (mut nodes, mut live) = (0, 0);
        self.root.count(&mut nodes, &mut live);
        nodes
    }

    /// Number of values currently reachable through the trie.
    pub fn live_count(&self) -> usize {
        let (mut nodes, mut live) = (0, usize::from(self.root.live_payload().is_some()));
        self.root.count(&mut nodes, &mut live);
        live
    }
}
