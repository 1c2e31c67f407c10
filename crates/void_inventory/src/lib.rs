//! Void Inventory - Grid Item Placement
//!
//! This crate decides where items of arbitrary rectangular footprint may sit
//! in grid containers and equipment slots, and drives drag-and-drop between
//! them.
//!
//! # Features
//!
//! - Occupancy grids with rotatable multi-cell footprints
//! - Placement verdicts: clear, out of bounds, intersects, invalid slot type,
//!   swap and stack
//! - Grid containers with stacking, splitting and first-fit insertion
//! - Single-cell equipment slots with equip/unequip events
//! - One transactional drag session per [`InventoryContext`]
//! - Template repository and persistence seams
//!
//! # Example
//!
//! ```
//! use void_inventory::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = TemplateCatalog::new()
//!     .with(ItemTemplate::new("rifle", "Rifle").with_category(ItemCategory::Weapon).with_size(3, 1));
//!
//! let mut ctx = InventoryContext::new().with_templates(Arc::new(catalog));
//! let pack = ctx.register_container(Container::new(ContainerId(1), ContainerConfig::backpack())).unwrap();
//! let hand = ctx.register_container(EquipmentSlot::new(ContainerId(2), SlotKind::MainHand)).unwrap();
//!
//! let (rifle, _) = ctx.spawn_item(pack, "rifle", 1).unwrap().placed.unwrap();
//! ctx.pick_up(pack, rifle).unwrap();
//! ctx.move_to(Some(HoverTarget::new(hand, GridCoordinate::ORIGIN)));
//! assert!(ctx.drop().unwrap().is_committed());
//! ```

pub mod config;
pub mod context;
pub mod drag;
pub mod equipment;
pub mod error;
pub mod events;
pub mod grid;
pub mod id;
pub mod inventory;
pub mod item;
pub mod persistence;
pub mod placement;
pub mod repository;
pub mod target;

pub mod prelude {
    pub use crate::config::ContainerConfig;
    pub use crate::context::InventoryContext;
    pub use crate::drag::{CancelReason, DragSession, DragState, DropOutcome, HoverTarget};
    pub use crate::equipment::{EquipmentSlot, SlotKind};
    pub use crate::error::{InventoryError, Rejection};
    pub use crate::events::{InventoryEvent, RemovalReason};
    pub use crate::grid::{Footprint, GridCoordinate, GridModel, Rotation, MAX_GRID_DIMENSION};
    pub use crate::id::{ContainerId, IdGenerator, InstanceId};
    pub use crate::inventory::{AddReport, Container};
    pub use crate::item::{ItemCategory, ItemInstance, ItemTemplate};
    pub use crate::persistence::{ContainerSnapshot, ContainerStore};
    pub use crate::placement::{PlacementQuery, PlacementResolver, PlacementResult, PlacementVerdict};
    pub use crate::repository::{TemplateCatalog, TemplateRepository};
    pub use crate::target::{AcceptPolicy, ContainerKind, DropTarget, ItemGridData, VisualHandle};
}

pub use error::Result;
pub use prelude::*;
