//! Storage Module
//!
//! Memory-mapped, fixed-stride block storage for B-tree nodes.
//!
//! ## Responsibilities
//! - Map the list file and grow it in whole slot batches
//! - Keep all byte-offset arithmetic of the file format in one place
//! - Hand out and reclaim node slots (intrusive free list)
//! - Serialize nodes to and from their blocks
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Header region (one page)                                 │
//! │   bincode FileHeader (70 bytes) | CRC32 (4) | zero pad   │
//! ├──────────────────────────────────────────────────────────┤
//! │ Slot 0 (block_size bytes, a whole number of pages)       │
//! │ ┌──────────────┬───────────┬──────────┬────────────────┐ │
//! │ │ElemCnt(8)    │ Flags(4)  │ Pad(4)   │                │ │
//! │ ├──────────────┴───────────┴──────────┘                │ │
//! │ │ Elements: (2T-1) x element_size                      │ │
//! │ │ Links:    2T x u64                                   │ │
//! │ │ Counts:   2T x u64                                   │ │
//! │ └──────────────────────────────────────────────────────┘ │
//! ├──────────────────────────────────────────────────────────┤
//! │ Slot 1 ...                                               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A freed slot stores the previous free-list head (i64, -1 = none) in its
//! first eight bytes.

mod allocator;
mod block;
mod header;
mod node_store;

pub(crate) use allocator::Allocator;
pub(crate) use block::{BlockLayout, BlockStore};
pub(crate) use header::FileHeader;
pub(crate) use node_store::NodeStore;

// =============================================================================
// Shared Constants
// =============================================================================

/// Index of a node block inside the file
pub(crate) type SlotId = u64;

/// Granularity of the header region and of node blocks
pub(crate) const PAGE_SIZE: usize = 4096;

/// Bytes reserved for the file header at offset 0
pub(crate) const HEADER_REGION_SIZE: usize = PAGE_SIZE;

/// Magic bytes identifying a list file
pub(crate) const MAGIC: &[u8; 4] = b"BTLS";

/// Current file format version
pub(crate) const FORMAT_VERSION: u16 = 1;

/// Node block header: ElemCnt (8) + Flags (4) + Pad (4) = 16 bytes
pub(crate) const NODE_HEADER_SIZE: usize = 16;

/// Width of one child link
pub(crate) const LINK_SIZE: usize = 8;

/// Width of one subtree count
pub(crate) const COUNT_SIZE: usize = 8;

/// Free-list terminator stored in the header and in freed slots
pub(crate) const NO_FREE_SLOT: i64 = -1;

/// Round `bytes` up to a whole number of pages
pub(crate) fn ceil_to_page(bytes: usize) -> usize {
    bytes.div_ceil(PAGE_SIZE) * PAGE_SIZE
}
