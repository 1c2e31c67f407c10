//! Error types for the inventory system

use crate::id::{ContainerId, InstanceId};
use crate::item::ItemInstance;
use thiserror::Error;

/// Why a placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Area falls outside the container grid
    OutOfBounds,
    /// Area overlaps items that cannot be merged or swapped
    Intersects,
    /// Container policy refuses the item
    InvalidSlotType,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "out of bounds"),
            Self::Intersects => write!(f, "intersects other items"),
            Self::InvalidSlotType => write!(f, "invalid slot type"),
        }
    }
}

/// Inventory system errors
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Placement refused by geometry or policy
    #[error("Placement rejected: {0}")]
    PlacementRejected(Rejection),

    /// No room for the item; the unplaced remainder is handed back
    #[error("Container is full, {} x {} could not be placed", .remainder.current_stack, .remainder.template_id)]
    CapacityExceeded {
        /// Whatever could not be placed
        remainder: Box<ItemInstance>,
    },

    /// A drag session is already active
    #[error("A drag session is already active")]
    ConcurrentDragViolation,

    /// A required collaborator was not provided
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(&'static str),

    /// Instance not found in the container
    #[error("Item not found: {0}")]
    ItemNotFound(InstanceId),

    /// Instance id already held by the container
    #[error("Item already present: {0}")]
    DuplicateItem(InstanceId),

    /// Container not registered
    #[error("Container not found: {0}")]
    ContainerNotFound(ContainerId),

    /// Container id already registered
    #[error("Container already registered: {0}")]
    DuplicateContainer(ContainerId),

    /// Template id unknown to the repository
    #[error("Unknown item template: {0}")]
    UnknownTemplate(String),

    /// Drag operation requested while idle
    #[error("No drag session is active")]
    NoActiveDrag,

    /// Container does not allow rotating items
    #[error("Rotation is not allowed in {0}")]
    RotationLocked(ContainerId),

    /// Invalid stack operation (amount of zero, not stackable, too large)
    #[error("Invalid stack operation: {0}")]
    InvalidStack(String),

    /// Persistence store failure
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl InventoryError {
    /// Turn a remainder into a capacity error
    pub fn capacity(remainder: ItemInstance) -> Self {
        Self::CapacityExceeded {
            remainder: Box::new(remainder),
        }
    }
}

impl From<Rejection> for InventoryError {
    fn from(rejection: Rejection) -> Self {
        Self::PlacementRejected(rejection)
    }
}

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;
