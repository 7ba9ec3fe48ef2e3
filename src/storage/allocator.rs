//! Slot Allocator
//!
//! Manages the lifecycle of node slots inside the list file.
//!
//! ## Strategy
//! - Freed slots form a singly linked list threaded through the slots
//!   themselves: the first eight bytes of a free slot hold the next free slot
//!   (i64, -1 terminates).
//! - When the list is empty, slots come from the never-used tail.
//! - When the tail reaches the end of the file, the file grows by
//!   `growth_batch` slots.
//! - Freeing the last tail slot shrinks the tail instead of touching the list.
//!
//! Invariant: no free-list entry is `>= free_tail_start`.

use bytes::{Buf, BufMut};

use crate::error::{ListError, Result};

use super::{BlockStore, FileHeader, SlotId, NO_FREE_SLOT};

/// Slot allocator; its state is the file header
#[derive(Debug)]
pub(crate) struct Allocator {
    header: FileHeader,
    growth_batch: u64,
}

impl Allocator {
    pub(crate) fn new(header: FileHeader, growth_batch: u64) -> Self {
        Self {
            header,
            growth_batch,
        }
    }

    pub(crate) fn header(&self) -> &FileHeader {
        &self.header
    }

    pub(crate) fn header_mut(&mut self) -> &mut FileHeader {
        &mut self.header
    }

    /// Hand out a slot, growing the file if it is full
    ///
    /// May remap `blocks`; callers must not hold block slices across it.
    pub(crate) fn new_slot(&mut self, blocks: &mut BlockStore) -> Result<SlotId> {
        let slot = if self.header.free_list_head != NO_FREE_SLOT {
            let slot = self.header.free_list_head as SlotId;
            let mut next = &blocks.block(slot)[..8];
            self.header.free_list_head = next.get_i64_le();
            slot
        } else {
            let slot = self.header.free_tail_start;
            if slot >= self.header.max_slots {
                self.grow(blocks)?;
            }
            self.header.free_tail_start += 1;
            slot
        };

        self.header.live_slots += 1;
        Ok(slot)
    }

    /// Return a slot to the allocator
    pub(crate) fn delete_slot(&mut self, blocks: &mut BlockStore, slot: SlotId) {
        debug_assert!(slot < self.header.free_tail_start, "freeing unallocated slot {}", slot);

        if slot + 1 == self.header.free_tail_start {
            self.header.free_tail_start -= 1;
        } else {
            let mut next = &mut blocks.block_mut(slot)[..8];
            next.put_i64_le(self.header.free_list_head);
            self.header.free_list_head = slot as i64;
        }

        self.header.live_slots -= 1;
    }

    /// Walk the free list
    ///
    /// Fails if the list leaves the allocated range or loops.
    pub(crate) fn free_slots(&self, blocks: &BlockStore) -> Result<Vec<SlotId>> {
        let mut slots = Vec::new();
        let mut cursor = self.header.free_list_head;

        while cursor != NO_FREE_SLOT {
            if cursor < 0 || cursor as u64 >= self.header.free_tail_start {
                return Err(ListError::Corruption(format!(
                    "free list entry {} outside allocated range (tail {})",
                    cursor, self.header.free_tail_start
                )));
            }
            if slots.len() as u64 >= self.header.free_tail_start {
                return Err(ListError::Corruption("free list contains a cycle".to_string()));
            }

            let slot = cursor as SlotId;
            slots.push(slot);
            let mut next = &blocks.block(slot)[..8];
            cursor = next.get_i64_le();
        }

        Ok(slots)
    }

    fn grow(&mut self, blocks: &mut BlockStore) -> Result<()> {
        let slots = self.header.max_slots + self.growth_batch;
        blocks.grow(slots)?;
        self.header.max_slots = slots;
        Ok(())
    }
}
