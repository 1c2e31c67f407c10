//! Grid container

use crate::config::ContainerConfig;
use crate::error::{InventoryError, Rejection, Result};
use crate::events::{InventoryEvent, RemovalReason};
use crate::grid::{Footprint, GridCoordinate, GridModel};
use crate::id::{ContainerId, InstanceId};
use crate::item::ItemInstance;
use crate::placement::PlacementResult;
use crate::target::{AcceptPolicy, ContainerKind, ItemGridData, VisualHandle};
use std::collections::HashMap;

/// What [`Container::add_item`] did with an incoming item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Existing stacks that were topped up, with the amount merged into each
    pub merged: Vec<(InstanceId, u32)>,
    /// Where the (remaining) item was placed, if anything was left to place
    pub placed: Option<(InstanceId, GridCoordinate)>,
}

impl AddReport {
    /// Whether the incoming item was fully absorbed by existing stacks
    pub fn fully_merged(&self) -> bool {
        self.placed.is_none() && !self.merged.is_empty()
    }
}

/// A bounded collection of items positioned on a cell grid.
///
/// Invariants: no two items share a cell, every covered cell is in bounds,
/// and each item's `position` is the top-left of its current footprint.
#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    name: String,
    kind: ContainerKind,
    config: ContainerConfig,
    policy: AcceptPolicy,
    grid: GridModel,
    /// Placed items in insertion order
    items: Vec<ItemInstance>,
    visuals: HashMap<InstanceId, VisualHandle>,
    /// Item currently picked up by a drag
    lifted: Option<InstanceId>,
    preview: Option<PlacementResult>,
    events: Vec<InventoryEvent>,
}

impl Container {
    /// Create an empty grid container
    pub fn new(id: ContainerId, config: ContainerConfig) -> Self {
        Self::with_kind(id, ContainerKind::Grid, config)
    }

    /// Create an empty single-cell container
    pub fn slot(id: ContainerId) -> Self {
        Self::with_kind(id, ContainerKind::Slot, ContainerConfig::slot())
    }

    fn with_kind(id: ContainerId, kind: ContainerKind, config: ContainerConfig) -> Self {
        let grid = match kind {
            ContainerKind::Grid => GridModel::new(config.columns, config.rows),
            ContainerKind::Slot => GridModel::new(1, 1),
        };
        Self {
            id,
            name: String::new(),
            kind,
            config,
            policy: AcceptPolicy::Any,
            grid,
            items: Vec::new(),
            visuals: HashMap::new(),
            lifted: None,
            preview: None,
            events: Vec::new(),
        }
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set accept policy
    pub fn with_policy(mut self, policy: AcceptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Container id
    pub fn id(&self) -> ContainerId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement geometry
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Configuration
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Accept policy
    pub fn policy(&self) -> &AcceptPolicy {
        &self.policy
    }

    /// Occupancy map
    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    /// Policy check
    pub fn can_accept(&self, item: &ItemInstance) -> bool {
        self.policy.allows(item)
    }

    /// Top-left cell and covered footprint `item` would use when dropped on
    /// `cell`. Slots hold any item in their single cell.
    pub fn placement_area(&self, item: &ItemInstance, cell: GridCoordinate) -> (GridCoordinate, Footprint) {
        match self.kind {
            ContainerKind::Grid => (cell, item.footprint),
            ContainerKind::Slot => (GridCoordinate::ORIGIN, Footprint::unit()),
        }
    }

    /// Get a held item
    pub fn item(&self, id: InstanceId) -> Option<&ItemInstance> {
        self.items.iter().find(|i| i.id == id)
    }

    fn item_mut(&mut self, id: InstanceId) -> Option<&mut ItemInstance> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Whether the item is held here
    pub fn contains(&self, id: InstanceId) -> bool {
        self.item(id).is_some()
    }

    /// Held items in insertion order
    pub fn items(&self) -> impl Iterator<Item = &ItemInstance> {
        self.items.iter()
    }

    /// Number of held items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is held
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First held instance of a template
    pub fn find_item(&self, template_id: &str) -> Option<&ItemInstance> {
        self.items.iter().find(|i| i.template_id == template_id)
    }

    /// Total quantity of a template across all stacks
    pub fn count_item(&self, template_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|i| i.template_id == template_id)
            .map(|i| i.current_stack)
            .sum()
    }

    /// Occupied cells
    pub fn used_cells(&self) -> usize {
        self.grid.occupied_count()
    }

    /// Free cells
    pub fn free_cells(&self) -> usize {
        self.grid.free_count()
    }

    /// First free spot for the item and the footprint it would use there,
    /// trying the rotated footprint when allowed. Policy is not checked.
    pub fn find_fit(&self, item: &ItemInstance) -> Option<(GridCoordinate, Footprint)> {
        if self.kind == ContainerKind::Slot {
            return self
                .grid
                .is_empty()
                .then_some((GridCoordinate::ORIGIN, item.footprint));
        }
        if let Some(position) = self.grid.find_first_fit(&item.footprint) {
            return Some((position, item.footprint));
        }
        if self.config.auto_rotate_on_add && self.config.allow_rotation && !item.footprint.is_square() {
            let rotated = item.footprint.rotated();
            return self.grid.find_first_fit(&rotated).map(|p| (p, rotated));
        }
        None
    }

    /// Where the item would be placed by [`add_item`](Self::add_item),
    /// ignoring stack merges
    pub fn try_find_placement(&self, item: &ItemInstance) -> Option<GridCoordinate> {
        if !self.can_accept(item) {
            return None;
        }
        self.find_fit(item).map(|(position, _)| position)
    }

    /// Whether [`add_item`](Self::add_item) would take the whole item
    pub fn can_add(&self, item: &ItemInstance) -> bool {
        if !self.can_accept(item) {
            return false;
        }
        if self.config.allow_stacking && item.is_stackable() {
            let room: u32 = self
                .items
                .iter()
                .filter(|e| e.can_merge(item))
                .map(|e| e.spare_capacity())
                .sum();
            if room >= item.current_stack {
                return true;
            }
        }
        self.find_fit(item).is_some()
    }

    /// Add an item wherever it fits.
    ///
    /// Stackable items first top up existing stacks of the same template.
    /// Whatever is left is placed at the first free spot. When nothing fits
    /// the remainder is returned in [`InventoryError::CapacityExceeded`];
    /// merges already made stay made.
    pub fn add_item(&mut self, mut item: ItemInstance) -> Result<AddReport> {
        if self.contains(item.id) {
            return Err(InventoryError::DuplicateItem(item.id));
        }
        if !self.can_accept(&item) {
            log::warn!("{} refuses {}", self.id, item.template_id);
            return Err(Rejection::InvalidSlotType.into());
        }

        let mut report = AddReport::default();
        if self.config.allow_stacking && item.is_stackable() {
            let mut remaining = item.current_stack;
            for existing in self.items.iter_mut() {
                if remaining == 0 {
                    break;
                }
                if !existing.can_merge(&item) || existing.spare_capacity() == 0 {
                    continue;
                }
                let left = existing.add_stack(remaining);
                report.merged.push((existing.id, remaining - left));
                remaining = left;
                self.events.push(InventoryEvent::StackChanged {
                    item: existing.id,
                    quantity: existing.current_stack,
                });
            }
            item.current_stack = remaining;
            if remaining == 0 {
                log::debug!("{} merged {} into existing stacks", self.id, item.template_id);
                return Ok(report);
            }
        }

        match self.find_fit(&item) {
            Some((position, footprint)) => {
                item.footprint = footprint;
                let id = self.insert(item, position);
                report.placed = Some((id, position));
                Ok(report)
            }
            None => {
                log::warn!(
                    "{} is full, {} x {} left over",
                    self.id,
                    item.current_stack,
                    item.template_id
                );
                self.events.push(InventoryEvent::Full {
                    template_id: item.template_id.clone(),
                    overflow: item.current_stack,
                });
                Err(InventoryError::capacity(item))
            }
        }
    }

    /// Add an item at an explicit top-left cell
    pub fn add_item_at(&mut self, item: ItemInstance, position: GridCoordinate) -> Result<InstanceId> {
        if self.contains(item.id) {
            return Err(InventoryError::DuplicateItem(item.id));
        }
        if !self.can_accept(&item) {
            return Err(Rejection::InvalidSlotType.into());
        }
        let (position, cells) = self.placement_area(&item, position);
        if !self.grid.contains_area(position, &cells) {
            return Err(Rejection::OutOfBounds.into());
        }
        if !self.grid.is_area_free(position, &cells) {
            return Err(Rejection::Intersects.into());
        }
        Ok(self.insert(item, position))
    }

    /// Place a validated item
    fn insert(&mut self, mut item: ItemInstance, position: GridCoordinate) -> InstanceId {
        let (position, cells) = self.placement_area(&item, position);
        self.grid.place(item.id, position, &cells);
        item.position = Some(position);

        log::debug!("{} placed {} {} at {}", self.id, item.template_id, item.id, position);
        self.events.push(InventoryEvent::ItemAdded {
            item: item.id,
            template_id: item.template_id.clone(),
            position,
            quantity: item.current_stack,
        });

        let id = item.id;
        self.items.push(item);
        id
    }

    /// Take an item out. `reason` only shows up in the emitted event.
    pub fn remove_item(&mut self, id: InstanceId, reason: RemovalReason) -> Result<ItemInstance> {
        let index = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or(InventoryError::ItemNotFound(id))?;

        let mut item = self.items.remove(index);
        self.grid.remove(id);
        self.visuals.remove(&id);
        if self.lifted == Some(id) {
            self.lifted = None;
        }
        item.position = None;

        log::debug!("{} removed {} {} ({:?})", self.id, item.template_id, id, reason);
        self.events.push(InventoryEvent::ItemRemoved {
            item: id,
            template_id: item.template_id.clone(),
            reason,
        });
        Ok(item)
    }

    /// Move an item to a new top-left cell, keeping its rotation
    pub fn move_item(&mut self, id: InstanceId, position: GridCoordinate) -> Result<()> {
        let footprint = self.item(id).ok_or(InventoryError::ItemNotFound(id))?.footprint;
        self.relocate(id, position, footprint)
    }

    /// Move an item to a new top-left cell with a new footprint. The item's
    /// own cells count as free.
    pub fn relocate(&mut self, id: InstanceId, position: GridCoordinate, footprint: Footprint) -> Result<()> {
        let item = self.item(id).ok_or(InventoryError::ItemNotFound(id))?;
        let mut candidate = item.clone();
        candidate.footprint = footprint;
        let from = item.position;

        let (position, cells) = self.placement_area(&candidate, position);
        if !self.grid.contains_area(position, &cells) {
            return Err(Rejection::OutOfBounds.into());
        }
        if !self.grid.is_area_free_ignoring(position, &cells, id) {
            return Err(Rejection::Intersects.into());
        }

        self.grid.remove(id);
        self.grid.place(id, position, &cells);
        if let Some(item) = self.item_mut(id) {
            item.position = Some(position);
            item.footprint = footprint;
        }

        if let Some(from) = from.filter(|from| *from != position) {
            log::debug!("{} moved {} from {} to {}", self.id, id, from, position);
            self.events.push(InventoryEvent::ItemMoved { item: id, from, to: position });
        }
        Ok(())
    }

    /// Rotate a placed item in place (same top-left cell)
    pub fn rotate_item(&mut self, id: InstanceId) -> Result<()> {
        if !self.config.allow_rotation {
            return Err(InventoryError::RotationLocked(self.id));
        }
        let item = self.item(id).ok_or(InventoryError::ItemNotFound(id))?;
        let position = item.position.unwrap_or(GridCoordinate::ORIGIN);
        let rotated = item.footprint.rotated();
        self.relocate(id, position, rotated)
    }

    /// Split `amount` off a stack into a new instance placed at the first
    /// free spot
    pub fn split_stack(&mut self, id: InstanceId, amount: u32, new_id: InstanceId) -> Result<InstanceId> {
        if self.contains(new_id) {
            return Err(InventoryError::DuplicateItem(new_id));
        }
        let item = self.item(id).ok_or(InventoryError::ItemNotFound(id))?;
        let mut probe = item.clone();
        let Some(split) = probe.split(amount, new_id) else {
            return Err(InventoryError::InvalidStack(format!(
                "cannot split {} off a stack of {}",
                amount, item.current_stack
            )));
        };
        let Some((position, footprint)) = self.find_fit(&split) else {
            return Err(InventoryError::InvalidStack(format!(
                "no free cells for {} split off {}",
                amount, id
            )));
        };

        let quantity = probe.current_stack;
        if let Some(item) = self.item_mut(id) {
            item.current_stack = quantity;
        }
        self.events.push(InventoryEvent::StackChanged { item: id, quantity });

        let mut split = split;
        split.footprint = footprint;
        Ok(self.insert(split, position))
    }

    /// Merge `amount` into a held stack. Returns the remainder.
    pub fn add_to_stack(&mut self, id: InstanceId, amount: u32) -> Result<u32> {
        let item = self.item_mut(id).ok_or(InventoryError::ItemNotFound(id))?;
        if !item.is_stackable() {
            return Err(InventoryError::InvalidStack(format!("{} is not stackable", item.template_id)));
        }
        let remainder = item.add_stack(amount);
        let quantity = item.current_stack;
        self.events.push(InventoryEvent::StackChanged { item: id, quantity });
        Ok(remainder)
    }

    /// Take `amount` off a held stack; an emptied stack is removed.
    /// Returns the amount actually taken.
    pub fn take_from_stack(&mut self, id: InstanceId, amount: u32) -> Result<u32> {
        let item = self.item_mut(id).ok_or(InventoryError::ItemNotFound(id))?;
        let removed = item.remove_stack(amount);
        let quantity = item.current_stack;
        if quantity == 0 {
            self.remove_item(id, RemovalReason::Consumed)?;
        } else {
            self.events.push(InventoryEvent::StackChanged { item: id, quantity });
        }
        Ok(removed)
    }

    /// Copy of every held item, in insertion order
    pub fn contents(&self) -> Vec<ItemInstance> {
        self.items.clone()
    }

    /// Replace every held item, e.g. after loading a save.
    ///
    /// Items with a position are validated there, the rest go to the first
    /// free spot. On any failure the container is left untouched.
    pub fn set_contents(&mut self, items: Vec<ItemInstance>) -> Result<()> {
        let mut staged = Self::with_kind(self.id, self.kind, self.config.clone());
        staged.policy = self.policy.clone();

        for mut item in items {
            if let Some(problem) = item.invariant_violation() {
                log::warn!("{} refuses restored item: {}", self.id, problem);
                return Err(InventoryError::InvalidStack(problem));
            }
            match item.position {
                Some(position) => {
                    staged.add_item_at(item, position)?;
                }
                None => {
                    if staged.contains(item.id) {
                        return Err(InventoryError::DuplicateItem(item.id));
                    }
                    let Some((position, footprint)) = staged.find_fit(&item) else {
                        return Err(InventoryError::capacity(item));
                    };
                    item.footprint = footprint;
                    staged.insert(item, position);
                }
            }
        }

        self.grid = staged.grid;
        self.items = staged.items;
        self.visuals.clear();
        self.lifted = None;
        self.preview = None;
        log::debug!("{} restored {} items", self.id, self.items.len());
        Ok(())
    }

    /// Remove everything, e.g. when the container is torn down
    pub fn clear(&mut self) -> Vec<ItemInstance> {
        let ids: Vec<InstanceId> = self.items.iter().map(|i| i.id).collect();
        ids.into_iter()
            .filter_map(|id| self.remove_item(id, RemovalReason::Destroyed).ok())
            .collect()
    }

    /// Mark an item as picked up and hand out a working copy
    pub fn lift(&mut self, id: InstanceId) -> Result<ItemInstance> {
        let item = self.item(id).cloned().ok_or(InventoryError::ItemNotFound(id))?;
        self.lifted = Some(id);
        Ok(item)
    }

    /// Put a picked-up item back on display
    pub fn settle(&mut self, id: InstanceId) {
        if self.lifted == Some(id) {
            self.lifted = None;
        }
    }

    /// Item currently picked up from here
    pub fn lifted(&self) -> Option<InstanceId> {
        self.lifted
    }

    /// Current preview highlight
    pub fn preview(&self) -> Option<&PlacementResult> {
        self.preview.as_ref()
    }

    /// Record a preview highlight
    pub fn set_preview(&mut self, preview: PlacementResult) {
        self.preview = Some(preview);
    }

    /// Drop the preview highlight
    pub fn clear_preview(&mut self) {
        self.preview = None;
    }

    /// Attach a rendering widget to a held item
    pub fn register_visual(&mut self, id: InstanceId, visual: VisualHandle) -> Result<()> {
        if !self.contains(id) {
            return Err(InventoryError::ItemNotFound(id));
        }
        self.visuals.insert(id, visual);
        Ok(())
    }

    /// Detach the rendering widget of an item
    pub fn unregister_visual(&mut self, id: InstanceId) -> Option<VisualHandle> {
        self.visuals.remove(&id)
    }

    /// Drawing data for a held item
    pub fn item_grid_data(&self, id: InstanceId) -> Option<ItemGridData> {
        let item = self.item(id)?;
        let position = item.position?;
        let (_, cells) = self.placement_area(item, position);
        let size = self.config.cell_size;
        Some(ItemGridData {
            item: id,
            position,
            width: cells.width(),
            height: cells.height(),
            angle: item.footprint.angle(),
            pixel_origin: [position.x as f32 * size, position.y as f32 * size],
            pixel_size: [cells.width() as f32 * size, cells.height() as f32 * size],
            visual: self.visuals.get(&id).copied(),
            lifted: self.lifted == Some(id),
        })
    }

    /// Queue an event raised by a wrapper around this container
    pub(crate) fn push_event(&mut self, event: InventoryEvent) {
        self.events.push(event);
    }

    /// Take queued events
    pub fn drain_events(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.events)
    }
}
