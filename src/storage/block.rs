//! Block Store
//!
//! Raw view over the memory-mapped list file.
//!
//! `BlockLayout` owns every offset computation of the format: where a slot
//! starts and where its element, link and count arrays live. `BlockStore`
//! applies that layout to the mapping and grows the file.
//!
//! Growth remaps the file, so `grow()` takes `&mut self`: the borrow checker
//! guarantees no block slice survives a remap.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;

use crate::config::max_node_elements;
use crate::error::{ListError, Result};

use super::{
    ceil_to_page, SlotId, COUNT_SIZE, HEADER_REGION_SIZE, LINK_SIZE, NODE_HEADER_SIZE,
};

// =============================================================================
// Block Layout
// =============================================================================

/// Fixed geometry of a node block for one `(order, element_size)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockLayout {
    order: usize,
    element_size: usize,
    block_size: usize,
}

impl BlockLayout {
    pub(crate) fn new(order: usize, element_size: usize) -> Self {
        let raw = NODE_HEADER_SIZE
            + max_node_elements(order) * element_size
            + (max_node_elements(order) + 1) * (LINK_SIZE + COUNT_SIZE);

        Self {
            order,
            element_size,
            block_size: ceil_to_page(raw),
        }
    }

    pub(crate) fn order(&self) -> usize {
        self.order
    }

    pub(crate) fn element_size(&self) -> usize {
        self.element_size
    }

    /// Stride between consecutive slots
    pub(crate) fn block_size(&self) -> usize {
        self.block_size
    }

    /// Element capacity of a block (`2T - 1`)
    pub(crate) fn max_elements(&self) -> usize {
        max_node_elements(self.order)
    }

    /// Link and count capacity of a block (`2T`)
    pub(crate) fn max_links(&self) -> usize {
        self.max_elements() + 1
    }

    /// Byte offset of a slot from the start of the file
    pub(crate) fn slot_offset(&self, slot: SlotId) -> usize {
        HEADER_REGION_SIZE + slot as usize * self.block_size
    }

    /// File length needed to hold `slots` blocks
    pub(crate) fn file_len(&self, slots: u64) -> u64 {
        HEADER_REGION_SIZE as u64 + slots * self.block_size as u64
    }

    /// Number of whole slots a file of `len` bytes holds
    pub(crate) fn slots_in(&self, len: u64) -> u64 {
        len.saturating_sub(HEADER_REGION_SIZE as u64) / self.block_size as u64
    }

    // -------------------------------------------------------------------------
    // In-block offsets
    // -------------------------------------------------------------------------

    pub(crate) fn element_offset(&self, index: usize) -> usize {
        NODE_HEADER_SIZE + index * self.element_size
    }

    pub(crate) fn links_offset(&self) -> usize {
        NODE_HEADER_SIZE + self.max_elements() * self.element_size
    }

    pub(crate) fn link_offset(&self, index: usize) -> usize {
        self.links_offset() + index * LINK_SIZE
    }

    pub(crate) fn counts_offset(&self) -> usize {
        self.links_offset() + self.max_links() * LINK_SIZE
    }

    pub(crate) fn count_offset(&self, index: usize) -> usize {
        self.counts_offset() + index * COUNT_SIZE
    }
}

// =============================================================================
// Block Store
// =============================================================================

/// Growable memory-mapped file split into a header region and fixed blocks
#[derive(Debug)]
pub(crate) struct BlockStore {
    path: PathBuf,
    file: File,
    mmap: MmapMut,
    layout: BlockLayout,
    /// Number of whole blocks currently backed by the file
    slot_capacity: u64,
}

impl BlockStore {
    /// Create (or truncate) a file sized for `slots` blocks
    pub(crate) fn create(path: &Path, layout: BlockLayout, slots: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.set_len(layout.file_len(slots))?;

        // SAFETY: the file was just truncated and sized by us; it is opened
        // read-write and the mapping is owned by this store, which is the only
        // writer of the file for its lifetime.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap,
            layout,
            slot_capacity: slots,
        })
    }

    /// Map an existing file
    ///
    /// Only checks that a full header region is present; the header itself
    /// is validated by the caller.
    pub(crate) fn open(path: &Path, layout: BlockLayout) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();

        if len < HEADER_REGION_SIZE as u64 {
            return Err(ListError::CorruptFile(format!(
                "'{}' is {} bytes, shorter than the {} byte header",
                path.display(),
                len,
                HEADER_REGION_SIZE
            )));
        }

        // SAFETY: single-writer precondition of the list format; the mapping
        // lives no longer than this store and every access is bounds-checked
        // slice indexing.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            mmap,
            layout,
            slot_capacity: layout.slots_in(len),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Move the file to `path`; the open handle and mapping follow the inode
    pub(crate) fn rename_to(&mut self, path: &Path) -> Result<()> {
        fs::rename(&self.path, path)?;
        self.path = path.to_path_buf();
        Ok(())
    }

    pub(crate) fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub(crate) fn slot_capacity(&self) -> u64 {
        self.slot_capacity
    }

    pub(crate) fn file_len(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Header region bytes
    pub(crate) fn header(&self) -> &[u8] {
        &self.mmap[..HEADER_REGION_SIZE]
    }

    pub(crate) fn header_mut(&mut self) -> &mut [u8] {
        &mut self.mmap[..HEADER_REGION_SIZE]
    }

    /// Bytes of one block. Panics if `slot` is beyond the mapped file.
    pub(crate) fn block(&self, slot: SlotId) -> &[u8] {
        let start = self.layout.slot_offset(slot);
        &self.mmap[start..start + self.layout.block_size()]
    }

    pub(crate) fn block_mut(&mut self, slot: SlotId) -> &mut [u8] {
        let start = self.layout.slot_offset(slot);
        let end = start + self.layout.block_size();
        &mut self.mmap[start..end]
    }

    /// Extend the file to hold `slots` blocks and remap it
    pub(crate) fn grow(&mut self, slots: u64) -> Result<()> {
        if slots <= self.slot_capacity {
            return Ok(());
        }

        self.mmap.flush()?;

        let new_len = self.layout.file_len(slots);
        self.file.set_len(new_len)?;

        // SAFETY: `&mut self` means no slice into the old mapping is alive;
        // the file was extended before remapping and the old map is dropped
        // on assignment.
        self.mmap = unsafe { MmapMut::map_mut(&self.file)? };
        self.slot_capacity = slots;

        tracing::debug!(
            path = %self.path.display(),
            slots,
            bytes = new_len,
            "grew list file"
        );

        Ok(())
    }

    /// Flush dirty pages to disk
    pub(crate) fn flush(&self) -> Result<()> {
        self.mmap.flush()?;
        Ok(())
    }
}
