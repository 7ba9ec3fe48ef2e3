//! List Module
//!
//! The public face of the crate: a persistent list backed by one file.
//!
//! ## Responsibilities
//! - File lifecycle: open-or-create, bulk construction, close, rebuild
//! - Bounds checks on every positional operation
//! - Keep the on-disk header current after every mutation
//!
//! ## Bounds
//! Positions behave like `Vec` positions: `insert` accepts `0..=len`, every
//! other operation `0..len`. An out-of-range position is a programming error
//! and panics with the same message `Vec` uses.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::element::Element;
use crate::error::Result;
use crate::storage::{NodeStore, SlotId};
use crate::tree::{OrderStatisticTree, TreeStats};

/// Persistent, memory-mapped sequence with logarithmic positional access
///
/// ## Ownership Model
/// Every operation copies elements in or out of the mapping. The one
/// exception, [`BTreeList::element_mut`], hands out an [`ElementMut`] that
/// borrows the list mutably, so nothing can grow (and remap) the file while
/// the handle is alive.
///
/// Dropping a list closes it on a best-effort basis; call
/// [`BTreeList::close`] to observe errors.
#[derive(Debug)]
pub struct BTreeList<E: Element> {
    /// List configuration
    config: Config,

    /// Tree over the mapped file
    tree: OrderStatisticTree<E>,

    /// Set once `close()` has run so `Drop` does not repeat it
    closed: bool,
}

/// File-level counters read from the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Elements in the list
    pub elements: u64,
    /// Slots holding a node
    pub live_slots: u64,
    /// Slots handed out at least once (live or on the free list)
    pub allocated_slots: u64,
    /// Slots the file can hold before it grows
    pub capacity_slots: u64,
    /// Current file length in bytes
    pub file_bytes: u64,
}

impl<E: Element> BTreeList<E> {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const REBUILD_SUFFIX: &'static str = "rebuild";

    /// Open the list stored at `path`, creating an empty one if the file does
    /// not exist
    ///
    /// An existing file must have been written with the same order and
    /// element type, otherwise this fails with `ListError::Incompatible`.
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();

        if !path.exists() {
            return Self::create(path, config);
        }

        let store: NodeStore<E> = NodeStore::open(path, &config)?;
        debug!(
            path = %path.display(),
            elements = store.total_size(),
            live_slots = store.header().live_slots,
            "opened list"
        );

        Ok(Self::from_tree(OrderStatisticTree::open(store, &config), config))
    }

    /// Open with an order (convenience method)
    ///
    /// Uses the default config with the given order
    pub fn open_or_create(path: impl AsRef<Path>, order: usize) -> Result<Self> {
        let config = Config::builder().order(order).build();
        Self::open(path, config)
    }

    /// Create an empty list at `path`, replacing any existing file
    pub fn create(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();

        let store = NodeStore::create(path, &config, config.growth_batch)?;
        let tree = OrderStatisticTree::create(store, &config)?;
        debug!(path = %path.display(), order = config.order, "created list");

        Ok(Self::from_tree(tree, config))
    }

    /// Create a list of `len` default elements
    pub fn create_with_size(path: impl AsRef<Path>, config: Config, len: u64) -> Result<Self>
    where
        E: Default,
    {
        Self::create_filled(path, config, len, E::default())
    }

    /// Create a list of `len` copies of `value`
    pub fn create_filled(
        path: impl AsRef<Path>,
        config: Config,
        len: u64,
        value: E,
    ) -> Result<Self> {
        let mut list = Self::create(path, config)?;
        for _ in 0..len {
            list.append(value.clone())?;
        }
        list.tree.store_mut().sync_header()?;
        Ok(list)
    }

    /// Create a list holding `items` in iteration order
    pub fn create_from_iter<I>(path: impl AsRef<Path>, config: Config, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
    {
        let mut list = Self::create(path, config)?;
        for item in items {
            list.append(item)?;
        }
        list.tree.store_mut().sync_header()?;
        Ok(list)
    }

    fn from_tree(tree: OrderStatisticTree<E>, config: Config) -> Self {
        Self {
            config,
            tree,
            closed: false,
        }
    }

    // =========================================================================
    // Positional Operations
    // =========================================================================

    /// Insert `value` at `index`, shifting later elements right
    ///
    /// # Panics
    /// If `index > len()`.
    pub fn insert(&mut self, index: u64, value: E) -> Result<()> {
        let len = self.len();
        if index > len {
            panic!("insertion index (is {index}) should be <= len (is {len})");
        }

        self.tree.insert(index, value)?;
        self.tree.store_mut().sync_header()
    }

    /// Append `value` at the end
    pub fn push(&mut self, value: E) -> Result<()> {
        self.append(value)?;
        self.tree.store_mut().sync_header()
    }

    /// Remove and return the element at `index`, shifting later elements left
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn extract(&mut self, index: u64) -> Result<E> {
        let len = self.len();
        if index >= len {
            panic!("removal index (is {index}) should be < len (is {len})");
        }

        let value = self.tree.extract(index)?;
        self.tree.store_mut().sync_header()?;
        Ok(value)
    }

    /// Copy of the element at `index`
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn get(&self, index: u64) -> Result<E> {
        self.check_index(index);
        self.tree.get(index)
    }

    /// Overwrite the element at `index`, returning the previous value
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn set(&mut self, index: u64, value: E) -> Result<E> {
        self.check_index(index);
        self.tree.set(index, value)
    }

    /// Handle to the element at `index` that reads and writes the mapping
    /// in place
    ///
    /// # Panics
    /// If `index >= len()`.
    pub fn element_mut(&mut self, index: u64) -> Result<ElementMut<'_, E>> {
        self.check_index(index);
        let (slot, position) = self.tree.locate(index)?;

        Ok(ElementMut {
            store: self.tree.store_mut(),
            slot,
            position,
        })
    }

    pub fn len(&self) -> u64 {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over copies of all elements in order
    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            list: self,
            front: 0,
            back: self.len(),
        }
    }

    /// Copy the whole list into memory
    pub fn to_vec(&self) -> Result<Vec<E>> {
        self.iter().collect()
    }

    fn append(&mut self, value: E) -> Result<()> {
        let len = self.len();
        self.tree.insert(len, value)
    }

    fn check_index(&self, index: u64) {
        let len = self.len();
        if index >= len {
            panic!("index out of bounds: the len is {len} but the index is {index}");
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Compact the tree into a fresh file and atomically replace the old one
    ///
    /// Afterwards the root is slot 0, levels are stored breadth-first and no
    /// freed slots remain. On failure the list keeps its current file and no
    /// temporary file is left behind.
    pub fn rebuild(&mut self) -> Result<()> {
        let path = self.path().to_path_buf();
        let temp_path = Self::rebuild_path(&path);
        let live_slots = self.tree.store().header().live_slots;

        let mut target = match self.compact_to(&temp_path, live_slots) {
            Ok(target) => target,
            Err(e) => {
                Self::discard(&temp_path);
                return Err(e);
            }
        };

        // The compacted store stays mapped across the rename, so nothing
        // fallible runs after the old file is replaced.
        if let Err(e) = target.rename_to(&path) {
            drop(target);
            Self::discard(&temp_path);
            return Err(e);
        }
        self.tree = OrderStatisticTree::open(target, &self.config);

        debug!(
            path = %path.display(),
            nodes = live_slots,
            file_bytes = self.tree.store().file_len(),
            "rebuilt list"
        );
        Ok(())
    }

    /// Persist the header and flush dirty pages
    pub fn flush(&mut self) -> Result<()> {
        self.tree.store_mut().flush()
    }

    /// Close the list, rebuilding first if `Config::rebuild_on_close` is set
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.finish()
    }

    /// Check every structural invariant of the tree
    ///
    /// Fails with `ListError::Corruption` describing the first violation.
    pub fn verify(&self) -> Result<TreeStats> {
        self.tree.verify()
    }

    /// Header counters, without walking the tree
    pub fn stats(&self) -> StorageStats {
        let store = self.tree.store();
        let header = store.header();

        StorageStats {
            elements: header.total_size,
            live_slots: header.live_slots,
            allocated_slots: header.free_tail_start,
            capacity_slots: header.max_slots,
            file_bytes: store.file_len(),
        }
    }

    pub fn path(&self) -> &Path {
        self.tree.store().path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn finish(&mut self) -> Result<()> {
        if self.config.rebuild_on_close {
            self.rebuild()?;
        }
        self.flush()?;

        debug!(path = %self.path().display(), elements = self.len(), "closed list");
        Ok(())
    }

    fn compact_to(&self, temp_path: &Path, live_slots: u64) -> Result<NodeStore<E>> {
        let mut target: NodeStore<E> = NodeStore::create(temp_path, &self.config, live_slots)?;
        self.tree.compact_into(&mut target)?;
        target.flush()?;
        Ok(target)
    }

    /// Remove a partial rebuild file
    fn discard(temp_path: &Path) {
        match fs::remove_file(temp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %temp_path.display(), error = %e, "failed to remove rebuild file");
            }
        }
    }

    fn rebuild_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(Self::REBUILD_SUFFIX);
        PathBuf::from(name)
    }
}

impl<E: Element> Drop for BTreeList<E> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.finish() {
            warn!(path = %self.path().display(), error = %e, "failed to close list");
        }
    }
}

impl<'a, E: Element> IntoIterator for &'a BTreeList<E> {
    type Item = Result<E>;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Iterator over copies of a list's elements
pub struct Iter<'a, E: Element> {
    list: &'a BTreeList<E>,
    front: u64,
    back: u64,
}

impl<'a, E: Element> Iterator for Iter<'a, E> {
    type Item = Result<E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.list.tree.get(self.front);
        self.front += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.back - self.front) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl<'a, E: Element> DoubleEndedIterator for Iter<'a, E> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(self.list.tree.get(self.back))
    }
}

impl<'a, E: Element> ExactSizeIterator for Iter<'a, E> {}

// =============================================================================
// In-place Element Access
// =============================================================================

/// Element handle pointing straight into the mapping
///
/// Holds the list's mutable borrow; no structural operation can run until it
/// is dropped.
pub struct ElementMut<'a, E: Element> {
    store: &'a mut NodeStore<E>,
    slot: SlotId,
    position: usize,
}

impl<'a, E: Element> ElementMut<'a, E> {
    /// Decode the current value
    pub fn get(&self) -> E {
        self.store.element(self.slot, self.position)
    }

    /// Encode `value` in place
    pub fn set(&mut self, value: E) {
        value.write_to(self.as_bytes_mut());
    }

    /// Encoded bytes of the element
    pub fn as_bytes(&self) -> &[u8] {
        self.store.element_bytes(self.slot, self.position)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.store.element_bytes_mut(self.slot, self.position)
    }
}
