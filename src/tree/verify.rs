//! Structural verification
//!
//! Walks every reachable node and checks the tree against its on-disk
//! bookkeeping. Used by tests and by `BTreeList::verify`.

use std::collections::HashSet;

use crate::element::Element;
use crate::error::{ListError, Result};
use crate::storage::SlotId;

use super::OrderStatisticTree;

/// Shape of a verified tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Number of levels, 1 for a lone root
    pub height: usize,
    /// Reachable nodes
    pub node_count: u64,
    /// Elements counted node by node
    pub element_count: u64,
    /// Highest reachable slot
    pub max_slot: SlotId,
}

struct Visit {
    slot: SlotId,
    depth: usize,
    expected_count: Option<u64>,
}

impl<E: Element> OrderStatisticTree<E> {
    /// Check every structural invariant, returning the tree's shape
    pub(crate) fn verify(&self) -> Result<TreeStats> {
        let header = self.store.header();
        let root = self.store.root_slot();
        let free: HashSet<SlotId> = self.store.free_slots()?.into_iter().collect();

        let mut seen = HashSet::new();
        let mut stats = TreeStats::default();
        let mut leaf_depth = None;
        let mut stack = vec![Visit {
            slot: root,
            depth: 1,
            expected_count: None,
        }];

        while let Some(visit) = stack.pop() {
            let slot = visit.slot;

            if slot >= header.free_tail_start {
                return Err(corrupt(slot, "lies beyond the allocated tail"));
            }
            if free.contains(&slot) {
                return Err(corrupt(slot, "is reachable but on the free list"));
            }
            if !seen.insert(slot) {
                return Err(corrupt(slot, "is linked more than once"));
            }

            let node = self.store.get(slot)?;
            let is_root = slot == root;

            if node.is_root() != is_root {
                return Err(corrupt(slot, "has a wrong ROOT flag"));
            }
            if node.len() > self.max_elements() {
                return Err(corrupt(slot, "holds more than 2T-1 elements"));
            }
            if !is_root && node.len() < self.min_elements() {
                return Err(corrupt(slot, "holds fewer than T-1 elements"));
            }
            if let Some(expected) = visit.expected_count {
                if node.total_subtree_elements() != expected {
                    return Err(corrupt(slot, "disagrees with its parent's count"));
                }
            }

            stats.node_count += 1;
            stats.element_count += node.len() as u64;
            stats.max_slot = stats.max_slot.max(slot);
            stats.height = stats.height.max(visit.depth);

            if node.is_leaf() {
                if node.counts().iter().any(|&c| c != 0) {
                    return Err(corrupt(slot, "is a leaf with non-zero counts"));
                }
                match leaf_depth {
                    None => leaf_depth = Some(visit.depth),
                    Some(depth) if depth != visit.depth => {
                        return Err(corrupt(slot, "is a leaf at an uneven depth"));
                    }
                    Some(_) => {}
                }
                continue;
            }

            if node.is_empty() {
                return Err(corrupt(slot, "is an internal node without elements"));
            }
            for i in (0..node.links().len()).rev() {
                stack.push(Visit {
                    slot: node.link(i),
                    depth: visit.depth + 1,
                    expected_count: Some(node.count(i)),
                });
            }
        }

        if stats.element_count != header.total_size {
            return Err(ListError::Corruption(format!(
                "tree holds {} elements, header records {}",
                stats.element_count, header.total_size
            )));
        }
        if stats.node_count != header.live_slots {
            return Err(ListError::Corruption(format!(
                "{} reachable nodes, header records {} live slots",
                stats.node_count, header.live_slots
            )));
        }

        Ok(stats)
    }
}

fn corrupt(slot: SlotId, problem: &str) -> ListError {
    ListError::Corruption(format!("slot {} {}", slot, problem))
}
