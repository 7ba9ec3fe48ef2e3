//! Configuration for btree_list
//!
//! Centralized configuration with sensible defaults.

use crate::error::{ListError, Result};

/// Main configuration for a list file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Tree Configuration
    // -------------------------------------------------------------------------
    /// B-tree order `T`: nodes hold at most `2T - 1` elements and every
    /// non-root node keeps at least `T - 1`.
    ///
    /// Fixed for the lifetime of a file; reopening with a different order
    /// fails with `ListError::Incompatible`.
    pub order: usize,

    // -------------------------------------------------------------------------
    // Allocator Configuration
    // -------------------------------------------------------------------------
    /// Number of node slots added each time the file runs out of space.
    /// Larger batches grow the file less often but leave more unused tail.
    pub growth_batch: u64,

    // -------------------------------------------------------------------------
    // Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// Compact the tree into a fresh file when the list is closed
    pub rebuild_on_close: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order: 128,
            growth_batch: 100,
            rebuild_on_close: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration describes a usable tree
    pub fn validate(&self) -> Result<()> {
        if self.order < 2 {
            return Err(ListError::Config(format!(
                "order must be at least 2, got {}",
                self.order
            )));
        }
        if self.order > u32::MAX as usize {
            return Err(ListError::Config(format!(
                "order {} does not fit the file header",
                self.order
            )));
        }
        if self.growth_batch == 0 {
            return Err(ListError::Config(
                "growth batch must be at least one slot".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum number of elements a node may hold (`2T - 1`)
    pub fn max_elements(&self) -> usize {
        max_node_elements(self.order)
    }

    /// Minimum number of elements a non-root node must keep (`T - 1`)
    pub fn min_elements(&self) -> usize {
        min_node_elements(self.order)
    }
}

/// Element capacity of a node of order `order`
pub(crate) const fn max_node_elements(order: usize) -> usize {
    2 * order - 1
}

/// Fill floor of a non-root node of order `order`
pub(crate) const fn min_node_elements(order: usize) -> usize {
    order - 1
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the B-tree order `T`
    pub fn order(mut self, order: usize) -> Self {
        self.config.order = order;
        self
    }

    /// Set the number of slots added per file growth
    pub fn growth_batch(mut self, slots: u64) -> Self {
        self.config.growth_batch = slots;
        self
    }

    /// Compact the file when the list is closed
    pub fn rebuild_on_close(mut self, rebuild: bool) -> Self {
        self.config.rebuild_on_close = rebuild;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
