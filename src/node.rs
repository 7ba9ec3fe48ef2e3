//! B-tree node
//!
//! In-memory form of one node block. Pure value type: no I/O happens here.
//!
//! A node with `n` elements always carries `n + 1` links and `n + 1` subtree
//! counts, leaves included (their links and counts are zero placeholders).
//! `counts[i]` is the number of elements reachable through `links[i]`.
//!
//! ```text
//!   links:    l0      l1      l2      l3
//!   counts:   c0      c1      c2      c3
//!   elements:     e0      e1      e2
//! ```

use crate::storage::SlotId;

/// Role flags of a node, bitmask-encoded on disk
pub(crate) const ROOT_FLAG: u32 = 1;
pub(crate) const LEAF_FLAG: u32 = 2;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node<E> {
    elements: Vec<E>,
    links: Vec<SlotId>,
    counts: Vec<u64>,
    flags: u32,
}

impl<E> Node<E> {
    /// Build a node from its parts
    pub(crate) fn from_parts(
        elements: Vec<E>,
        links: Vec<SlotId>,
        counts: Vec<u64>,
        flags: u32,
    ) -> Self {
        debug_assert_eq!(links.len(), elements.len() + 1);
        debug_assert_eq!(counts.len(), elements.len() + 1);
        Self {
            elements,
            links,
            counts,
            flags,
        }
    }

    /// The root of an empty tree: no elements, ROOT and LEAF
    pub(crate) fn empty_root() -> Self {
        Self::from_parts(Vec::new(), vec![0], vec![0], ROOT_FLAG | LEAF_FLAG)
    }

    /// A new root above two halves of a split root
    pub(crate) fn new_root(median: E, links: [SlotId; 2], counts: [u64; 2]) -> Self {
        Self::from_parts(vec![median], links.to_vec(), counts.to_vec(), ROOT_FLAG)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub(crate) fn elements(&self) -> &[E] {
        &self.elements
    }

    pub(crate) fn links(&self) -> &[SlotId] {
        &self.links
    }

    pub(crate) fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub(crate) fn flags(&self) -> u32 {
        self.flags
    }

    /// Replace element `i`, returning the old value
    pub(crate) fn replace_element(&mut self, i: usize, value: E) -> E {
        std::mem::replace(&mut self.elements[i], value)
    }

    pub(crate) fn link(&self, i: usize) -> SlotId {
        self.links[i]
    }

    pub(crate) fn set_link(&mut self, i: usize, slot: SlotId) {
        self.links[i] = slot;
    }

    pub(crate) fn count(&self, i: usize) -> u64 {
        self.counts[i]
    }

    pub(crate) fn set_count(&mut self, i: usize, count: u64) {
        self.counts[i] = count;
    }

    /// Elements this node contributes to its parent's count: own elements
    /// plus everything below it
    pub(crate) fn total_subtree_elements(&self) -> u64 {
        self.elements.len() as u64 + self.counts.iter().sum::<u64>()
    }

    // =========================================================================
    // Flags
    // =========================================================================

    pub(crate) fn is_root(&self) -> bool {
        self.flags & ROOT_FLAG != 0
    }

    pub(crate) fn set_root(&mut self, root: bool) {
        if root {
            self.flags |= ROOT_FLAG;
        } else {
            self.flags &= !ROOT_FLAG;
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.flags & LEAF_FLAG != 0
    }

    // =========================================================================
    // Insert / Extract
    // =========================================================================

    /// Insert `value` at position `i` with a zero link and count after it.
    /// The caller fixes up the placeholder.
    pub(crate) fn insert(&mut self, i: usize, value: E) {
        self.elements.insert(i, value);
        self.links.insert(i + 1, 0);
        self.counts.insert(i + 1, 0);
    }

    /// Remove element `i` only; links and counts are left to the caller
    pub(crate) fn extract(&mut self, i: usize) -> E {
        self.elements.remove(i)
    }

    pub(crate) fn extract_link_before(&mut self, i: usize) -> SlotId {
        self.links.remove(i)
    }

    pub(crate) fn extract_link_after(&mut self, i: usize) -> SlotId {
        self.links.remove(i + 1)
    }

    pub(crate) fn extract_count_before(&mut self, i: usize) -> u64 {
        self.counts.remove(i)
    }

    pub(crate) fn extract_count_after(&mut self, i: usize) -> u64 {
        self.counts.remove(i + 1)
    }

    /// Prepend an element together with the link and count before it
    pub(crate) fn push_front(&mut self, value: E, link: SlotId, count: u64) {
        self.elements.insert(0, value);
        self.links.insert(0, link);
        self.counts.insert(0, count);
    }

    /// Append an element together with the link and count after it
    pub(crate) fn push_back(&mut self, value: E, link: SlotId, count: u64) {
        self.elements.push(value);
        self.links.push(link);
        self.counts.push(count);
    }

    /// Remove the first element with the link and count before it
    pub(crate) fn pop_front(&mut self) -> (E, SlotId, u64) {
        let value = self.elements.remove(0);
        let link = self.links.remove(0);
        let count = self.counts.remove(0);
        (value, link, count)
    }

    /// Remove the last element with the link and count after it.
    /// Panics on an empty node.
    pub(crate) fn pop_back(&mut self) -> (E, SlotId, u64) {
        let last = self.elements.len() - 1;
        let value = self.elements.remove(last);
        let link = self.links.remove(last + 1);
        let count = self.counts.remove(last + 1);
        (value, link, count)
    }

    // =========================================================================
    // Split / Connect
    // =========================================================================

    /// Split around the median at `len / 2`
    ///
    /// Returns `(first_half, median, second_half)`. Both halves lose the ROOT
    /// flag and keep the LEAF flag.
    pub(crate) fn split(mut self) -> (Self, E, Self) {
        let mid = self.elements.len() / 2;

        let second_elements = self.elements.split_off(mid + 1);
        let second_links = self.links.split_off(mid + 1);
        let second_counts = self.counts.split_off(mid + 1);
        let median = self.elements.remove(mid);

        let flags = self.flags & !ROOT_FLAG;
        let first = Self::from_parts(self.elements, self.links, self.counts, flags);
        let second = Self::from_parts(second_elements, second_links, second_counts, flags);

        (first, median, second)
    }

    /// Inverse of `split`: `left.elements + [median] + right.elements`
    ///
    /// The result is never ROOT; it is a LEAF when `left` is.
    pub(crate) fn connect(left: Self, median: E, right: Self) -> Self {
        let flags = left.flags & !ROOT_FLAG;
        let mut elements = left.elements;
        let mut links = left.links;
        let mut counts = left.counts;

        elements.push(median);
        elements.extend(right.elements);
        links.extend(right.links);
        counts.extend(right.counts);

        Self::from_parts(elements, links, counts, flags)
    }
}
