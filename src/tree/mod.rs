//! Order-Statistic Tree
//!
//! Positional B-tree algorithms over a `NodeStore`.
//!
//! ## Rank Descent
//! Every operation resolves a position by walking subtree counts instead of
//! comparing keys:
//!
//! ```text
//! remaining = index
//! i = 0
//! while remaining > counts[i]:
//!     remaining -= counts[i] + 1
//!     i += 1
//! ```
//!
//! - `remaining == counts[i]` and `i < len`: element `i` of this node
//! - otherwise: the position lies inside `links[i]` at rank `remaining`
//!
//! Inserts always continue down to a leaf; lookups and extracts stop at the
//! node holding the element, which may be internal.
//!
//! ## Paths
//! Algorithms record the descent as an explicit `Vec<PathStep>` and work
//! bottom-up from it instead of recursing. Node values are copied out of the
//! mapping, so a file growth in the middle of an operation leaves nothing
//! dangling.

mod compact;
mod extract;
mod insert;
mod verify;

use crate::config::{max_node_elements, min_node_elements, Config};
use crate::element::Element;
use crate::error::{ListError, Result};
use crate::node::Node;
use crate::storage::{NodeStore, SlotId};

pub use verify::TreeStats;

/// One step of a root-to-leaf descent: the node visited and the link (or, at
/// the last step, the element position) taken inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathStep {
    pub slot: SlotId,
    pub index: usize,
}

/// Positional B-tree stored in one list file
#[derive(Debug)]
pub(crate) struct OrderStatisticTree<E> {
    store: NodeStore<E>,
    order: usize,
}

impl<E: Element> OrderStatisticTree<E> {
    /// Initialize an empty tree (a single ROOT|LEAF node) in a blank store
    pub(crate) fn create(mut store: NodeStore<E>, config: &Config) -> Result<Self> {
        let root = store.new_node(&Node::empty_root())?;
        store.set_root_slot(root);
        store.set_total_size(0);
        store.sync_header()?;

        Ok(Self {
            store,
            order: config.order,
        })
    }

    /// Wrap a store that already holds a tree
    pub(crate) fn open(store: NodeStore<E>, config: &Config) -> Self {
        Self {
            store,
            order: config.order,
        }
    }

    pub(crate) fn len(&self) -> u64 {
        self.store.total_size()
    }

    pub(crate) fn store(&self) -> &NodeStore<E> {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut NodeStore<E> {
        &mut self.store
    }

    pub(crate) fn max_elements(&self) -> usize {
        max_node_elements(self.order)
    }

    pub(crate) fn min_elements(&self) -> usize {
        min_node_elements(self.order)
    }

    // =========================================================================
    // Get / Set
    // =========================================================================

    /// Copy of the element at `index`
    pub(crate) fn get(&self, index: u64) -> Result<E> {
        let (slot, i) = self.locate(index)?;
        Ok(self.store.element(slot, i))
    }

    /// Overwrite the element at `index`, returning the old value
    pub(crate) fn set(&mut self, index: u64, value: E) -> Result<E> {
        let (slot, i) = self.locate(index)?;
        let mut node = self.store.get(slot)?;
        let old = node.replace_element(i, value);
        self.store.set(slot, &node)?;
        Ok(old)
    }

    /// Slot and in-node position of the element at `index`
    ///
    /// Reads only node headers and counts from the mapping.
    pub(crate) fn locate(&self, index: u64) -> Result<(SlotId, usize)> {
        let mut slot = self.store.root_slot();
        let mut remaining = index;

        loop {
            let len = self.store.node_len(slot);
            let mut i = 0;
            while i < len && remaining > self.store.count(slot, i) {
                remaining -= self.store.count(slot, i) + 1;
                i += 1;
            }

            if i < len && remaining == self.store.count(slot, i) {
                return Ok((slot, i));
            }
            if self.store.node_is_leaf(slot) {
                return Err(Self::ran_off(index, slot));
            }

            slot = self.store.link(slot, i);
        }
    }

    // =========================================================================
    // Descent Helpers
    // =========================================================================

    /// Descend to the leaf where an element inserted at `index` belongs
    ///
    /// Returns the ancestors, the leaf step (position to insert at) and the
    /// leaf itself.
    pub(crate) fn descend_to_leaf(
        &self,
        index: u64,
    ) -> Result<(Vec<PathStep>, PathStep, Node<E>)> {
        let mut ancestors = Vec::new();
        let mut slot = self.store.root_slot();
        let mut remaining = index;

        loop {
            let node = self.store.get(slot)?;
            let (i, rest) = rank_position(&node, remaining);

            if node.is_leaf() {
                return Ok((ancestors, PathStep { slot, index: i }, node));
            }

            ancestors.push(PathStep { slot, index: i });
            slot = node.link(i);
            remaining = rest;
        }
    }

    /// Descend to the node holding the element at `index`
    ///
    /// Returns the ancestors, the step naming the element and its node.
    pub(crate) fn descend_to_element(
        &self,
        index: u64,
    ) -> Result<(Vec<PathStep>, PathStep, Node<E>)> {
        let mut ancestors = Vec::new();
        let mut slot = self.store.root_slot();
        let mut remaining = index;

        loop {
            let node = self.store.get(slot)?;
            let (i, rest) = rank_position(&node, remaining);

            if i < node.len() && rest == node.count(i) {
                return Ok((ancestors, PathStep { slot, index: i }, node));
            }
            if node.is_leaf() {
                return Err(Self::ran_off(index, slot));
            }

            ancestors.push(PathStep { slot, index: i });
            slot = node.link(i);
            remaining = rest;
        }
    }

    /// Add `delta` to the count each step's link contributes
    pub(crate) fn adjust_counts(&mut self, steps: &[PathStep], delta: i64) -> Result<()> {
        for step in steps {
            let count = self.store.count(step.slot, step.index);
            let adjusted = count.checked_add_signed(delta).ok_or_else(|| {
                ListError::Corruption(format!(
                    "count {} of slot {} link {} cannot change by {}",
                    count, step.slot, step.index, delta
                ))
            })?;
            self.store.write_count(step.slot, step.index, adjusted);
        }
        Ok(())
    }

    fn ran_off(index: u64, slot: SlotId) -> ListError {
        ListError::Corruption(format!(
            "rank descent for index {} ran past leaf slot {}",
            index, slot
        ))
    }
}

/// Position inside `node` for rank `remaining`: the first `i` with
/// `remaining <= counts[i]`, and the rank left over inside `links[i]`
pub(crate) fn rank_position<E>(node: &Node<E>, mut remaining: u64) -> (usize, u64) {
    let mut i = 0;
    while i < node.len() && remaining > node.count(i) {
        remaining -= node.count(i) + 1;
        i += 1;
    }
    (i, remaining)
}
