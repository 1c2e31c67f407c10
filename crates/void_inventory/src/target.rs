//! Drop-target contract shared by grid containers and equipment slots
//!
//! The drag coordinator and the presentation layer only ever talk to
//! containers through [`DropTarget`]. Every method has a default that
//! forwards to the underlying [`Container`]; specializations override the
//! few operations whose side effects differ (an equipment slot raises
//! equip/unequip events from `add_stored_item`/`remove_stored_item`).

use crate::config::ContainerConfig;
use crate::error::Result;
use crate::events::{InventoryEvent, RemovalReason};
use crate::grid::{GridCoordinate, GridModel, Rotation};
use crate::id::{ContainerId, InstanceId};
use crate::inventory::{AddReport, Container};
use crate::item::{ItemCategory, ItemInstance};
use crate::placement::{PlacementResolver, PlacementResult};
use serde::{Deserialize, Serialize};

/// Placement geometry of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// Free-form grid, items cover their full footprint
    Grid,
    /// Single cell, any item occupies exactly that cell
    Slot,
}

/// Which items a container takes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AcceptPolicy {
    /// Everything
    #[default]
    Any,
    /// Only these categories
    Categories(Vec<ItemCategory>),
    /// Only these template ids
    Templates(Vec<String>),
}

impl AcceptPolicy {
    /// Check an item against the policy
    pub fn allows(&self, item: &ItemInstance) -> bool {
        match self {
            Self::Any => true,
            Self::Categories(categories) => categories.contains(&item.category),
            Self::Templates(templates) => templates.iter().any(|t| *t == item.template_id),
        }
    }
}

/// Opaque handle of a widget owned by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// What the rendering layer needs to draw one placed item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGridData {
    /// Item
    pub item: InstanceId,
    /// Top-left cell
    pub position: GridCoordinate,
    /// Covered columns
    pub width: u32,
    /// Covered rows
    pub height: u32,
    /// Footprint angle
    pub angle: Rotation,
    /// Top-left corner in pixels, relative to the container
    pub pixel_origin: [f32; 2],
    /// Size in pixels
    pub pixel_size: [f32; 2],
    /// Registered widget, if any
    pub visual: Option<VisualHandle>,
    /// Item is currently being dragged and should not be drawn in place
    pub lifted: bool,
}

/// Contract every drop destination implements
pub trait DropTarget {
    /// Underlying container
    fn container(&self) -> &Container;

    /// Underlying container, mutable
    fn container_mut(&mut self) -> &mut Container;

    /// Container id
    fn id(&self) -> ContainerId {
        self.container().id()
    }

    /// Placement geometry
    fn kind(&self) -> ContainerKind {
        self.container().kind()
    }

    /// Occupancy map
    fn grid(&self) -> &GridModel {
        self.container().grid()
    }

    /// Configuration
    fn config(&self) -> &ContainerConfig {
        self.container().config()
    }

    /// Pixel size of one cell
    fn cell_size(&self) -> f32 {
        self.container().config().cell_size
    }

    /// Policy check
    fn can_accept(&self, item: &ItemInstance) -> bool {
        self.container().can_accept(item)
    }

    /// Same-template stacks merge on drop
    fn allows_stacking(&self) -> bool {
        self.config().allow_stacking
    }

    /// Dropping on a single occupant swaps
    fn allows_swap(&self) -> bool {
        self.config().allow_swap
    }

    /// Items dragged out of here may rotate
    fn allows_rotation(&self) -> bool {
        self.config().allow_rotation
    }

    /// Look up a held item
    fn item(&self, id: InstanceId) -> Option<&ItemInstance> {
        self.container().item(id)
    }

    /// Compute the verdict for `item` hovering `cell` and keep it as the
    /// preview highlight. Item state is not touched.
    fn show_placement_target(&mut self, item: &ItemInstance, cell: GridCoordinate) -> PlacementResult {
        let result = PlacementResolver::resolve_over(item, self, cell);
        self.container_mut().set_preview(result.clone());
        result
    }

    /// Current preview highlight
    fn preview(&self) -> Option<&PlacementResult> {
        self.container().preview()
    }

    /// Clear any preview state left by a drag
    fn finalize_drag(&mut self) {
        self.container_mut().clear_preview();
    }

    /// Put an item on the grid without presentation side effects
    fn add_stored_item(&mut self, item: ItemInstance, position: GridCoordinate) -> Result<InstanceId> {
        self.container_mut().add_item_at(item, position)
    }

    /// Store an item wherever it fits, merging stacks first
    fn store_item(&mut self, item: ItemInstance) -> Result<AddReport> {
        self.container_mut().add_item(item)
    }

    /// Take an item off the grid without presentation side effects
    fn remove_stored_item(&mut self, id: InstanceId, reason: RemovalReason) -> Result<ItemInstance> {
        self.container_mut().remove_item(id, reason)
    }

    /// Start of a transfer: detach the item from presentation and hand out
    /// a working copy. The item keeps its cells until the drop commits.
    fn pick_up(&mut self, id: InstanceId) -> Result<ItemInstance> {
        self.container_mut().lift(id)
    }

    /// End of a transfer that leaves the item where it was picked up
    fn cancel_pick_up(&mut self, id: InstanceId) {
        self.container_mut().settle(id);
    }

    /// End of a transfer: store the item at `position`
    fn drop_item(&mut self, item: ItemInstance, position: GridCoordinate) -> Result<InstanceId> {
        let id = self.add_stored_item(item, position)?;
        self.finalize_drag();
        Ok(id)
    }

    /// Capacity probe
    fn try_find_placement(&self, item: &ItemInstance) -> Option<GridCoordinate> {
        self.container().try_find_placement(item)
    }

    /// Merge `amount` into a held stack. Returns the remainder.
    fn add_to_stack(&mut self, id: InstanceId, amount: u32) -> Result<u32> {
        self.container_mut().add_to_stack(id, amount)
    }

    /// Take `amount` off a held stack. Returns the amount removed.
    fn take_from_stack(&mut self, id: InstanceId, amount: u32) -> Result<u32> {
        self.container_mut().take_from_stack(id, amount)
    }

    /// Drawing data for a held item
    fn get_item_grid_data(&self, id: InstanceId) -> Option<ItemGridData> {
        self.container().item_grid_data(id)
    }

    /// Attach a rendering widget to a held item
    fn register_visual(&mut self, id: InstanceId, visual: VisualHandle) -> Result<()> {
        self.container_mut().register_visual(id, visual)
    }

    /// Detach the rendering widget of an item
    fn unregister_visual(&mut self, id: InstanceId) -> Option<VisualHandle> {
        self.container_mut().unregister_visual(id)
    }

    /// Every held item, in insertion order
    fn contents(&self) -> Vec<ItemInstance> {
        self.container().contents()
    }

    /// Replace every held item
    fn set_contents(&mut self, items: Vec<ItemInstance>) -> Result<()> {
        self.container_mut().set_contents(items)
    }

    /// Take queued events
    fn drain_events(&mut self) -> Vec<InventoryEvent> {
        self.container_mut().drain_events()
    }
}

impl DropTarget for Container {
    fn container(&self) -> &Container {
        self
    }

    fn container_mut(&mut self) -> &mut Container {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdGenerator;
    use crate::item::ItemTemplate;
    use crate::placement::PlacementVerdict;

    #[test]
    fn test_policy() {
        let ids = IdGenerator::new();
        let arrow = ItemTemplate::new("arrow", "Arrow")
            .with_category(ItemCategory::Ammo)
            .instantiate(ids.next(), 1);

        assert!(AcceptPolicy::Any.allows(&arrow));
        assert!(AcceptPolicy::Categories(vec![ItemCategory::Ammo]).allows(&arrow));
        assert!(!AcceptPolicy::Categories(vec![ItemCategory::Armor]).allows(&arrow));
        assert!(AcceptPolicy::Templates(vec!["arrow".into()]).allows(&arrow));
    }

    #[test]
    fn test_preview_is_cleared_by_finalize() {
        let ids = IdGenerator::new();
        let mut target: Box<dyn DropTarget> =
            Box::new(Container::new(ContainerId(3), ContainerConfig::grid(3, 3)));
        let gem = ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1);

        let result = target.show_placement_target(&gem, GridCoordinate::new(2, 2));
        assert_eq!(result.verdict, PlacementVerdict::Clear);
        assert_eq!(target.preview(), Some(&result));
        assert!(target.contents().is_empty());

        target.finalize_drag();
        assert!(target.preview().is_none());
    }

    #[test]
    fn test_grid_data_uses_cell_size() {
        let ids = IdGenerator::new();
        let mut target = Container::new(ContainerId(1), ContainerConfig::grid(4, 4).with_cell_size(32.0));
        let item = ItemTemplate::new("rifle", "Rifle").with_size(3, 1).instantiate(ids.next(), 1);
        let id = target.add_stored_item(item, GridCoordinate::new(1, 2)).unwrap();
        target.register_visual(id, VisualHandle(77)).unwrap();

        let data = target.get_item_grid_data(id).unwrap();
        assert_eq!(data.pixel_origin, [32.0, 64.0]);
        assert_eq!(data.pixel_size, [96.0, 32.0]);
        assert_eq!(data.visual, Some(VisualHandle(77)));
        assert!(!data.lifted);

        assert_eq!(target.unregister_visual(id), Some(VisualHandle(77)));
        assert_eq!(target.get_item_grid_data(id).unwrap().visual, None);
    }
}
