//! Container configuration

use serde::{Deserialize, Serialize};

/// Per-container placement configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Grid width in cells
    pub columns: u32,

    /// Grid height in cells
    pub rows: u32,

    /// Size of one cell in pixels, only used by the rendering bridge
    pub cell_size: f32,

    /// Items dragged out of this container may be rotated
    pub allow_rotation: bool,

    /// Dropping onto a single occupant swaps the two items
    pub allow_swap: bool,

    /// Same-template stackable items merge on drop and on add
    pub allow_stacking: bool,

    /// `add_item` retries with the rotated footprint when nothing fits
    pub auto_rotate_on_add: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            columns: 10,
            rows: 6,
            cell_size: 64.0,
            allow_rotation: true,
            allow_swap: true,
            allow_stacking: true,
            auto_rotate_on_add: true,
        }
    }
}

impl ContainerConfig {
    /// Grid of the given size with default rules
    pub fn grid(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            ..Default::default()
        }
    }

    /// Player backpack
    pub fn backpack() -> Self {
        Self::grid(8, 5)
    }

    /// Large storage chest
    pub fn stash() -> Self {
        Self::grid(12, 10)
    }

    /// Single equipment cell: no stacking, no rotation
    pub fn slot() -> Self {
        Self {
            columns: 1,
            rows: 1,
            cell_size: 96.0,
            allow_rotation: false,
            allow_swap: true,
            allow_stacking: false,
            auto_rotate_on_add: false,
        }
    }

    /// Set cell size
    pub fn with_cell_size(mut self, size: f32) -> Self {
        self.cell_size = size;
        self
    }

    /// Disable swapping
    pub fn without_swap(mut self) -> Self {
        self.allow_swap = false;
        self
    }

    /// Disable rotation
    pub fn without_rotation(mut self) -> Self {
        self.allow_rotation = false;
        self.auto_rotate_on_add = false;
        self
    }

    /// Disable stacking
    pub fn without_stacking(mut self) -> Self {
        self.allow_stacking = false;
        self
    }
}
