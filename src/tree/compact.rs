//! Compaction
//!
//! Copies the tree breadth-first into an empty store so that the root lands
//! in slot 0 and every level occupies consecutive slots. The copy has no free
//! list and no holes.

use std::collections::VecDeque;

use tracing::debug;

use crate::element::Element;
use crate::error::{ListError, Result};
use crate::storage::{NodeStore, SlotId};

use super::OrderStatisticTree;

impl<E: Element> OrderStatisticTree<E> {
    /// Write a compacted copy of the tree into `target`, which must be empty
    pub(crate) fn compact_into(&self, target: &mut NodeStore<E>) -> Result<()> {
        let mut queue: VecDeque<SlotId> = VecDeque::from([self.store.root_slot()]);
        let mut next_slot: SlotId = 1;
        let mut expected: SlotId = 0;

        while let Some(old_slot) = queue.pop_front() {
            let mut node = self.store.get(old_slot)?;

            if !node.is_leaf() {
                for i in 0..node.links().len() {
                    queue.push_back(node.link(i));
                    node.set_link(i, next_slot);
                    next_slot += 1;
                }
            }

            let slot = target.new_node(&node)?;
            if slot != expected {
                return Err(ListError::Corruption(format!(
                    "compaction target handed out slot {} instead of {}",
                    slot, expected
                )));
            }
            expected += 1;
        }

        target.set_root_slot(0);
        target.set_total_size(self.len());
        target.sync_header()?;

        debug!(nodes = expected, elements = self.len(), "compacted tree");
        Ok(())
    }
}
