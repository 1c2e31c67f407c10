//! Inventory events
//!
//! Side-channel notifications for systems outside the placement engine
//! (stat modifiers, audio, quest tracking). Containers queue them; the
//! coordinator drains them.

use crate::grid::GridCoordinate;
use crate::id::InstanceId;

/// Why an item left a container. Bookkeeping only, placement ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Item is gone for good
    Destroyed,
    /// Item moves to another container
    Relocated,
    /// Item handed to another owner (trade, loot, quest)
    GivenAway,
    /// Stack used up
    Consumed,
}

/// Inventory events
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryEvent {
    /// Item placed into the container
    ItemAdded {
        item: InstanceId,
        template_id: String,
        position: GridCoordinate,
        quantity: u32,
    },
    /// Item taken out of the container
    ItemRemoved {
        item: InstanceId,
        template_id: String,
        reason: RemovalReason,
    },
    /// Item moved within the container
    ItemMoved {
        item: InstanceId,
        from: GridCoordinate,
        to: GridCoordinate,
    },
    /// Stack size changed by a merge or split
    StackChanged {
        item: InstanceId,
        quantity: u32,
    },
    /// Two items traded places during a drop
    ItemsSwapped {
        placed: InstanceId,
        displaced: InstanceId,
    },
    /// Container could not take everything
    Full {
        template_id: String,
        overflow: u32,
    },
    /// Item put into an equipment slot
    ItemEquipped {
        item: InstanceId,
        template_id: String,
    },
    /// Item taken out of an equipment slot
    ItemUnequipped {
        item: InstanceId,
        template_id: String,
    },
}
