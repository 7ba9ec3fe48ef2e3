//! Positional extract with merge/rotate propagation
//!
//! ## Rebalancing
//! After an element leaves a leaf the affected node is checked bottom-up:
//!
//! - size `>= T-1` (or root): stop; every ancestor above loses one count
//! - sibling (left if one exists, else right) at `T-1`: merge node, separator
//!   and sibling into the node's slot, free the sibling, continue at the parent
//! - otherwise: rotate one element through the separator and stop
//!
//! An internal root left without elements is removed and its only child
//! becomes the root.

use tracing::trace;

use crate::element::Element;
use crate::error::Result;
use crate::node::Node;
use crate::storage::SlotId;

use super::{OrderStatisticTree, PathStep};

impl<E: Element> OrderStatisticTree<E> {
    /// Remove and return the element at `index`
    ///
    /// `index` must be `< len()`; the caller checks the bound.
    pub(crate) fn extract(&mut self, index: u64) -> Result<E> {
        let (mut path, step, mut node) = self.descend_to_element(index)?;

        let (removed, leaf_slot, leaf) = if node.is_leaf() {
            let removed = take_from_leaf(&mut node, step.index);
            (removed, step.slot, node)
        } else {
            // Replace with the in-order successor: first element of the
            // leftmost leaf under the link after the hit.
            path.push(PathStep {
                slot: step.slot,
                index: step.index + 1,
            });
            let mut slot = node.link(step.index + 1);
            let mut leaf = self.store.get(slot)?;
            while !leaf.is_leaf() {
                path.push(PathStep { slot, index: 0 });
                slot = leaf.link(0);
                leaf = self.store.get(slot)?;
            }

            let successor = take_from_leaf(&mut leaf, 0);
            let removed = node.replace_element(step.index, successor);
            self.store.set(step.slot, &node)?;

            (removed, slot, leaf)
        };

        self.rebalance(path, leaf_slot, leaf)?;

        let size = self.store.total_size();
        self.store.set_total_size(size - 1);

        Ok(removed)
    }

    /// Restore the size bounds from `node` (already one element short) up
    fn rebalance(&mut self, mut path: Vec<PathStep>, mut slot: SlotId, mut node: Node<E>) -> Result<()> {
        let min = self.min_elements();

        loop {
            let Some(step) = path.pop() else {
                return self.settle_root(slot, node);
            };

            if node.len() >= min {
                self.store.set(slot, &node)?;
                path.push(step);
                break;
            }

            let mut parent = self.store.get(step.slot)?;
            let ci = step.index;

            if ci > 0 {
                let sibling_slot = parent.link(ci - 1);
                let mut left = self.store.get(sibling_slot)?;

                if left.len() <= min {
                    let separator = parent.extract(ci - 1);
                    parent.extract_link_before(ci - 1);
                    parent.extract_count_before(ci - 1);

                    let merged = Node::connect(left, separator, node);
                    parent.set_count(ci - 1, merged.total_subtree_elements());
                    self.store.set(slot, &merged)?;
                    self.store.delete_slot(sibling_slot);
                    trace!(slot, freed = sibling_slot, "merged with left sibling");

                    slot = step.slot;
                    node = parent;
                    continue;
                }

                let (moved, link, count) = left.pop_back();
                let separator = parent.replace_element(ci - 1, moved);
                node.push_front(separator, link, count);
                parent.set_count(ci - 1, left.total_subtree_elements());
                parent.set_count(ci, node.total_subtree_elements());

                self.store.set(sibling_slot, &left)?;
                self.store.set(slot, &node)?;
                self.store.set(step.slot, &parent)?;
                trace!(slot, from = sibling_slot, "rotated from left sibling");
                break;
            }

            let sibling_slot = parent.link(ci + 1);
            let mut right = self.store.get(sibling_slot)?;

            if right.len() <= min {
                let separator = parent.extract(ci);
                parent.extract_link_after(ci);
                parent.extract_count_after(ci);

                let merged = Node::connect(node, separator, right);
                parent.set_count(ci, merged.total_subtree_elements());
                self.store.set(slot, &merged)?;
                self.store.delete_slot(sibling_slot);
                trace!(slot, freed = sibling_slot, "merged with right sibling");

                slot = step.slot;
                node = parent;
                continue;
            }

            let (moved, link, count) = right.pop_front();
            let separator = parent.replace_element(ci, moved);
            node.push_back(separator, link, count);
            parent.set_count(ci, node.total_subtree_elements());
            parent.set_count(ci + 1, right.total_subtree_elements());

            self.store.set(sibling_slot, &right)?;
            self.store.set(slot, &node)?;
            self.store.set(step.slot, &parent)?;
            trace!(slot, from = sibling_slot, "rotated from right sibling");
            break;
        }

        self.adjust_counts(&path, -1)?;
        Ok(())
    }

    /// Persist the root, collapsing it if it is internal and empty
    fn settle_root(&mut self, slot: SlotId, node: Node<E>) -> Result<()> {
        if !node.is_empty() || node.is_leaf() {
            return self.store.set(slot, &node);
        }

        let child_slot = node.link(0);
        let mut child = self.store.get(child_slot)?;
        child.set_root(true);
        self.store.set(child_slot, &child)?;
        self.store.set_root_slot(child_slot);
        self.store.delete_slot(slot);
        trace!(old_root = slot, new_root = child_slot, "collapsed root");

        Ok(())
    }
}

/// Remove element `i` of a leaf together with one placeholder link and count
fn take_from_leaf<E>(leaf: &mut Node<E>, i: usize) -> E {
    let value = leaf.extract(i);
    leaf.extract_link_after(i);
    leaf.extract_count_after(i);
    value
}
