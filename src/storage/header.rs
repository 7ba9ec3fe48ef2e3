//! File Header
//!
//! Persisted allocator and tree state, stored at offset 0 of the list file.
//!
//! ## Encoding
//! ```text
//! ┌────────────────────────────────────┬───────────┬──────────┐
//! │ bincode(FileHeader), 70 bytes      │ CRC32 (4) │ zero pad │
//! └────────────────────────────────────┴───────────┴──────────┘
//! ```
//! bincode's default options give a fixed-width little-endian encoding, so
//! the header always occupies the same bytes.

use serde::{Deserialize, Serialize};

use crate::error::{ListError, Result};

use super::{BlockLayout, SlotId, FORMAT_VERSION, HEADER_REGION_SIZE, MAGIC, NO_FREE_SLOT};

/// Encoded size of `FileHeader`: 4 + 2 + 4 + 4 + 7 * 8
pub(crate) const ENCODED_SIZE: usize = 70;

/// Size of the trailing checksum
const CHECKSUM_SIZE: usize = 4;

/// Everything needed to reopen a list file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FileHeader {
    pub magic: [u8; 4],
    pub version: u16,
    /// B-tree order `T` the file was created with
    pub order: u32,
    /// `Element::SIZE` of the stored type
    pub element_size: u32,
    /// Stride of node blocks
    pub block_size: u64,

    /// Head of the intrusive free list (-1 = empty)
    pub free_list_head: i64,
    /// First slot that has never been handed out
    pub free_tail_start: u64,
    /// Slots backed by the file before the next growth
    pub max_slots: u64,
    /// Slot of the root node
    pub root_slot: SlotId,
    /// Number of elements in the list
    pub total_size: u64,
    /// Number of allocated slots
    pub live_slots: u64,
}

impl FileHeader {
    /// Header of a file with `max_slots` empty slots and no nodes
    pub(crate) fn new(layout: &BlockLayout, max_slots: u64) -> Self {
        Self {
            magic: *MAGIC,
            version: FORMAT_VERSION,
            order: layout.order() as u32,
            element_size: layout.element_size() as u32,
            block_size: layout.block_size() as u64,
            free_list_head: NO_FREE_SLOT,
            free_tail_start: 0,
            max_slots,
            root_slot: 0,
            total_size: 0,
            live_slots: 0,
        }
    }

    /// Write the header and its checksum into the header region
    pub(crate) fn encode_into(&self, region: &mut [u8]) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), ENCODED_SIZE);

        let checksum = crc32fast::hash(&bytes);

        region[..ENCODED_SIZE].copy_from_slice(&bytes);
        region[ENCODED_SIZE..ENCODED_SIZE + CHECKSUM_SIZE]
            .copy_from_slice(&checksum.to_le_bytes());

        Ok(())
    }

    /// Read and validate a header region
    ///
    /// Fails with `CorruptFile` on a bad magic or checksum and with
    /// `Incompatible` on an unknown format version.
    pub(crate) fn decode(region: &[u8]) -> Result<Self> {
        if region.len() < HEADER_REGION_SIZE {
            return Err(ListError::CorruptFile(format!(
                "header region is {} bytes, expected {}",
                region.len(),
                HEADER_REGION_SIZE
            )));
        }

        if &region[0..4] != MAGIC {
            return Err(ListError::CorruptFile(format!(
                "invalid magic: expected {:?}, got {:?}",
                MAGIC,
                &region[0..4]
            )));
        }

        let bytes = &region[..ENCODED_SIZE];
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(&region[ENCODED_SIZE..ENCODED_SIZE + CHECKSUM_SIZE]);
        let stored = u32::from_le_bytes(stored);

        let computed = crc32fast::hash(bytes);
        if stored != computed {
            return Err(ListError::CorruptFile(format!(
                "header checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        let header: FileHeader = bincode::deserialize(bytes)?;

        if header.version != FORMAT_VERSION {
            return Err(ListError::Incompatible(format!(
                "unsupported format version {}",
                header.version
            )));
        }

        Ok(header)
    }

    /// Check that the file was written with the same geometry as `layout`
    pub(crate) fn check_layout(&self, layout: &BlockLayout) -> Result<()> {
        if self.element_size as usize != layout.element_size() {
            return Err(ListError::Incompatible(format!(
                "file stores {}-byte elements, opened with {}-byte elements",
                self.element_size,
                layout.element_size()
            )));
        }

        if self.order as usize != layout.order() {
            return Err(ListError::Incompatible(format!(
                "file was created with order {}, opened with order {}",
                self.order,
                layout.order()
            )));
        }

        if self.block_size != layout.block_size() as u64 {
            return Err(ListError::Incompatible(format!(
                "file block size {} differs from expected {}",
                self.block_size,
                layout.block_size()
            )));
        }

        Ok(())
    }

    /// Check the allocator fields against each other and the file length
    pub(crate) fn check_bounds(&self, slot_capacity: u64) -> Result<()> {
        if self.max_slots > slot_capacity {
            return Err(ListError::CorruptFile(format!(
                "header claims {} slots but the file holds {}",
                self.max_slots, slot_capacity
            )));
        }

        if self.free_tail_start > self.max_slots {
            return Err(ListError::CorruptFile(format!(
                "free tail {} is beyond capacity {}",
                self.free_tail_start, self.max_slots
            )));
        }

        if self.root_slot >= self.free_tail_start {
            return Err(ListError::CorruptFile(format!(
                "root slot {} is not an allocated slot (tail {})",
                self.root_slot, self.free_tail_start
            )));
        }

        if self.free_list_head >= self.free_tail_start as i64 || self.free_list_head < NO_FREE_SLOT
        {
            return Err(ListError::CorruptFile(format!(
                "free list head {} is outside the allocated range",
                self.free_list_head
            )));
        }

        Ok(())
    }
}
