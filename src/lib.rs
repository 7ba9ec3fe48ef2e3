//! # btree_list
//!
//! A persistent list stored as a B-tree inside one memory-mapped file:
//! - Logarithmic insert, extract, get and set by position
//! - Per-child subtree counts instead of keys (order-statistic tree)
//! - Fixed-stride node blocks with an intrusive free list
//! - Optional compaction into a fresh file on close
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        BTreeList                            │
//! │        (bounds checks, file lifecycle, rebuild)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  OrderStatisticTree                         │
//! │     (rank descent, split / merge / rotate, compaction)      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Node values
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      NodeStore                              │
//! │            (node (de)serialization, header)                 │
//! └──────────┬─────────────────────────────────┬────────────────┘
//!            │                                 │
//!            ▼                                 ▼
//!   ┌─────────────────┐               ┌─────────────────┐
//!   │    Allocator    │──── grows ───▶│   BlockStore    │
//!   │  (free list)    │               │     (mmap)      │
//!   └─────────────────┘               └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use btree_list::{BTreeList, Config};
//!
//! let config = Config::builder().order(64).build();
//! let mut list: BTreeList<u64> = BTreeList::open("numbers.btl", config)?;
//!
//! list.push(10)?;
//! list.insert(0, 5)?;
//! assert_eq!(list.get(1)?, 10);
//! assert_eq!(list.extract(0)?, 5);
//!
//! list.close()?;
//! # Ok::<(), btree_list::ListError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod element;

mod storage;
mod node;
mod tree;
mod list;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ListError, Result};
pub use config::{Config, ConfigBuilder};
pub use element::Element;
pub use list::{BTreeList, ElementMut, Iter, StorageStats};
pub use tree::TreeStats;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of btree_list
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
