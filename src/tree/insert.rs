//! Positional insert with split propagation

use tracing::trace;

use crate::element::Element;
use crate::error::Result;
use crate::node::Node;

use super::OrderStatisticTree;

impl<E: Element> OrderStatisticTree<E> {
    /// Insert `value` so that it ends up at `index`
    ///
    /// `index` must be `<= len()`; the caller checks the bound.
    pub(crate) fn insert(&mut self, index: u64, value: E) -> Result<()> {
        let (ancestors, leaf_step, mut node) = self.descend_to_leaf(index)?;
        node.insert(leaf_step.index, value);

        let mut slot = leaf_step.slot;
        let mut level = ancestors.len();

        while node.len() >= self.max_elements() {
            let (first, median, second) = node.split();
            let first_count = first.total_subtree_elements();
            let second_count = second.total_subtree_elements();

            self.store.set(slot, &first)?;
            let second_slot = self.store.new_node(&second)?;
            trace!(
                slot,
                second_slot,
                first_count,
                second_count,
                "split node"
            );

            if level == 0 {
                let root = Node::new_root(median, [slot, second_slot], [first_count, second_count]);
                let root_slot = self.store.new_node(&root)?;
                self.store.set_root_slot(root_slot);
                trace!(root_slot, "grew new root");

                self.finish_insert();
                return Ok(());
            }

            level -= 1;
            let step = ancestors[level];
            let mut parent = self.store.get(step.slot)?;
            parent.insert(step.index, median);
            parent.set_count(step.index, first_count);
            parent.set_link(step.index + 1, second_slot);
            parent.set_count(step.index + 1, second_count);

            node = parent;
            slot = step.slot;
        }

        self.store.set(slot, &node)?;
        self.adjust_counts(&ancestors[..level], 1)?;

        self.finish_insert();
        Ok(())
    }

    fn finish_insert(&mut self) {
        let size = self.store.total_size();
        self.store.set_total_size(size + 1);
    }
}
