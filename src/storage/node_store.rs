//! Node Store
//!
//! Serializes nodes to and from their blocks and layers node-level
//! operations over the allocator.
//!
//! Every `set` rewrites the whole block (header, elements, links, counts);
//! only the first `elements_cnt` entries of each array are meaningful on
//! read. The field readers (`node_len`, `count`, `link`, ...) read single
//! values straight from the mapping for descents that do not need a full
//! node.

use std::marker::PhantomData;
use std::path::Path;

use bytes::{Buf, BufMut};

use crate::config::Config;
use crate::element::Element;
use crate::error::{ListError, Result};
use crate::node::{Node, LEAF_FLAG};

use super::{Allocator, BlockLayout, BlockStore, FileHeader, SlotId, NODE_HEADER_SIZE};

/// Typed node storage over one list file
#[derive(Debug)]
pub(crate) struct NodeStore<E> {
    blocks: BlockStore,
    allocator: Allocator,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Element> NodeStore<E> {
    /// Create a file with room for `capacity` nodes and no nodes in it
    pub(crate) fn create(path: &Path, config: &Config, capacity: u64) -> Result<Self> {
        let layout = BlockLayout::new(config.order, E::SIZE);
        let capacity = capacity.max(1);
        let blocks = BlockStore::create(path, layout, capacity)?;
        let header = FileHeader::new(&layout, capacity);

        let mut store = Self {
            blocks,
            allocator: Allocator::new(header, config.growth_batch),
            _marker: PhantomData,
        };
        store.sync_header()?;

        Ok(store)
    }

    /// Open an existing file, validating its header against `config` and `E`
    pub(crate) fn open(path: &Path, config: &Config) -> Result<Self> {
        let layout = BlockLayout::new(config.order, E::SIZE);
        let blocks = BlockStore::open(path, layout)?;

        let header = FileHeader::decode(blocks.header())?;
        header.check_layout(&layout)?;
        header.check_bounds(blocks.slot_capacity())?;

        Ok(Self {
            blocks,
            allocator: Allocator::new(header, config.growth_batch),
            _marker: PhantomData,
        })
    }

    // =========================================================================
    // Node I/O
    // =========================================================================

    /// Deserialize the node in `slot`
    pub(crate) fn get(&self, slot: SlotId) -> Result<Node<E>> {
        let layout = self.blocks.layout();
        let block = self.blocks.block(slot);

        let mut info = &block[..NODE_HEADER_SIZE];
        let len = info.get_u64_le() as usize;
        let flags = info.get_u32_le();

        if len > layout.max_elements() {
            return Err(ListError::Corruption(format!(
                "slot {} claims {} elements, capacity is {}",
                slot,
                len,
                layout.max_elements()
            )));
        }

        let elements = (0..len)
            .map(|i| {
                let start = layout.element_offset(i);
                E::read_from(&block[start..start + E::SIZE])
            })
            .collect();

        let mut links_buf = &block[layout.links_offset()..];
        let links = (0..=len).map(|_| links_buf.get_u64_le()).collect();

        let mut counts_buf = &block[layout.counts_offset()..];
        let counts = (0..=len).map(|_| counts_buf.get_u64_le()).collect();

        Ok(Node::from_parts(elements, links, counts, flags))
    }

    /// Serialize `node` into `slot` (full block rewrite)
    pub(crate) fn set(&mut self, slot: SlotId, node: &Node<E>) -> Result<()> {
        let layout = *self.blocks.layout();

        if node.len() > layout.max_elements() {
            return Err(ListError::Corruption(format!(
                "node with {} elements does not fit a block of {}",
                node.len(),
                layout.max_elements()
            )));
        }

        let block = self.blocks.block_mut(slot);

        let mut info = &mut block[..NODE_HEADER_SIZE];
        info.put_u64_le(node.len() as u64);
        info.put_u32_le(node.flags());
        info.put_u32_le(0);

        for (i, element) in node.elements().iter().enumerate() {
            let start = layout.element_offset(i);
            element.write_to(&mut block[start..start + E::SIZE]);
        }

        let mut links_buf = &mut block[layout.links_offset()..];
        for &link in node.links() {
            links_buf.put_u64_le(link);
        }

        let mut counts_buf = &mut block[layout.counts_offset()..];
        for &count in node.counts() {
            counts_buf.put_u64_le(count);
        }

        Ok(())
    }

    // =========================================================================
    // Slot Lifecycle
    // =========================================================================

    pub(crate) fn new_slot(&mut self) -> Result<SlotId> {
        self.allocator.new_slot(&mut self.blocks)
    }

    /// Allocate a slot and write `node` into it
    pub(crate) fn new_node(&mut self, node: &Node<E>) -> Result<SlotId> {
        let slot = self.new_slot()?;
        self.set(slot, node)?;
        Ok(slot)
    }

    pub(crate) fn delete_slot(&mut self, slot: SlotId) {
        self.allocator.delete_slot(&mut self.blocks, slot);
    }

    pub(crate) fn free_slots(&self) -> Result<Vec<SlotId>> {
        self.allocator.free_slots(&self.blocks)
    }

    // =========================================================================
    // Direct Field Access
    // =========================================================================

    pub(crate) fn node_len(&self, slot: SlotId) -> usize {
        let mut info = &self.blocks.block(slot)[..8];
        info.get_u64_le() as usize
    }

    pub(crate) fn node_is_leaf(&self, slot: SlotId) -> bool {
        let mut info = &self.blocks.block(slot)[8..12];
        info.get_u32_le() & LEAF_FLAG != 0
    }

    pub(crate) fn link(&self, slot: SlotId, i: usize) -> SlotId {
        let offset = self.blocks.layout().link_offset(i);
        let mut buf = &self.blocks.block(slot)[offset..offset + 8];
        buf.get_u64_le()
    }

    pub(crate) fn count(&self, slot: SlotId, i: usize) -> u64 {
        let offset = self.blocks.layout().count_offset(i);
        let mut buf = &self.blocks.block(slot)[offset..offset + 8];
        buf.get_u64_le()
    }

    pub(crate) fn write_count(&mut self, slot: SlotId, i: usize, count: u64) {
        let offset = self.blocks.layout().count_offset(i);
        let mut buf = &mut self.blocks.block_mut(slot)[offset..offset + 8];
        buf.put_u64_le(count);
    }

    pub(crate) fn element(&self, slot: SlotId, i: usize) -> E {
        E::read_from(self.element_bytes(slot, i))
    }

    pub(crate) fn element_bytes(&self, slot: SlotId, i: usize) -> &[u8] {
        let offset = self.blocks.layout().element_offset(i);
        &self.blocks.block(slot)[offset..offset + E::SIZE]
    }

    pub(crate) fn element_bytes_mut(&mut self, slot: SlotId, i: usize) -> &mut [u8] {
        let offset = self.blocks.layout().element_offset(i);
        &mut self.blocks.block_mut(slot)[offset..offset + E::SIZE]
    }

    // =========================================================================
    // Header State
    // =========================================================================

    pub(crate) fn header(&self) -> &FileHeader {
        self.allocator.header()
    }

    pub(crate) fn root_slot(&self) -> SlotId {
        self.allocator.header().root_slot
    }

    pub(crate) fn set_root_slot(&mut self, slot: SlotId) {
        self.allocator.header_mut().root_slot = slot;
    }

    pub(crate) fn total_size(&self) -> u64 {
        self.allocator.header().total_size
    }

    pub(crate) fn set_total_size(&mut self, size: u64) {
        self.allocator.header_mut().total_size = size;
    }

    pub(crate) fn path(&self) -> &Path {
        self.blocks.path()
    }

    pub(crate) fn rename_to(&mut self, path: &Path) -> Result<()> {
        self.blocks.rename_to(path)
    }

    pub(crate) fn file_len(&self) -> u64 {
        self.blocks.file_len()
    }

    /// Write the allocator state into the header region
    pub(crate) fn sync_header(&mut self) -> Result<()> {
        let header = self.allocator.header().clone();
        header.encode_into(self.blocks.header_mut())
    }

    /// Persist the header and flush the mapping
    pub(crate) fn flush(&mut self) -> Result<()> {
        self.sync_header()?;
        self.blocks.flush()
    }
}
