//! Drag-and-drop session
//!
//! A session is created by [`InventoryContext::pick_up`], refreshed by
//! `move_to` and `rotate`, and consumed by `drop` or `cancel`. The dragged
//! item stays in its source container until a drop commits, so the working
//! copy held here only carries the hover state and the (possibly rotated)
//! footprint.
//!
//! Commits are all-or-nothing: the containers involved are snapshotted
//! before the first mutation and restored if any step fails.
//!
//! [`InventoryContext::pick_up`]: crate::context::InventoryContext::pick_up

use crate::error::{InventoryError, Rejection, Result};
use crate::events::{InventoryEvent, RemovalReason};
use crate::grid::{Footprint, GridCoordinate};
use crate::id::{ContainerId, IdGenerator, InstanceId};
use crate::item::ItemInstance;
use crate::placement::{PlacementResult, PlacementVerdict};
use crate::target::DropTarget;
use std::collections::BTreeMap;

/// Container cell under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HoverTarget {
    /// Hovered container
    pub container: ContainerId,
    /// Hovered cell, relative to the container
    pub cell: GridCoordinate,
}

impl HoverTarget {
    /// Create a new hover target
    pub fn new(container: ContainerId, cell: GridCoordinate) -> Self {
        Self { container, cell }
    }
}

/// Drag state of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DragState {
    /// No drag in progress
    #[default]
    Idle,
    /// An item is being dragged
    Dragging,
}

/// Why a drop did not commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// The last verdict refused the drop
    Rejected(Rejection),
    /// No verdict since pick-up or since the last rotation
    NoVerdict,
    /// Cancelled on request
    Requested,
}

/// Terminal state of a drag session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Item now sits at `position` in `container`
    Placed {
        item: InstanceId,
        container: ContainerId,
        position: GridCoordinate,
    },
    /// Item took the place of `displaced`, which went back to the source
    Swapped {
        placed: InstanceId,
        displaced: InstanceId,
        container: ContainerId,
    },
    /// Dragged stack was merged into `into`; `remainder` stayed at the origin
    Stacked {
        into: InstanceId,
        moved: u32,
        remainder: u32,
    },
    /// Nothing changed, the item is back at its origin
    Cancelled(CancelReason),
}

impl DropOutcome {
    /// Whether the drop changed any container
    pub fn is_committed(&self) -> bool {
        !matches!(self, Self::Cancelled(_))
    }
}

/// The one active drag
#[derive(Debug, Clone)]
pub struct DragSession {
    item: ItemInstance,
    origin: ContainerId,
    origin_position: GridCoordinate,
    origin_footprint: Footprint,
    hover: Option<HoverTarget>,
    last_result: Option<PlacementResult>,
}

impl DragSession {
    pub(crate) fn begin(origin: ContainerId, item: ItemInstance) -> Self {
        Self {
            origin,
            origin_position: item.position.unwrap_or(GridCoordinate::ORIGIN),
            origin_footprint: item.footprint,
            hover: None,
            last_result: None,
            item,
        }
    }

    /// Working copy of the dragged item
    pub fn item(&self) -> &ItemInstance {
        &self.item
    }

    /// Container the item was picked up from
    pub fn origin(&self) -> ContainerId {
        self.origin
    }

    /// Top-left cell the item was picked up from
    pub fn origin_position(&self) -> GridCoordinate {
        self.origin_position
    }

    /// Footprint at pick-up
    pub fn origin_footprint(&self) -> Footprint {
        self.origin_footprint
    }

    /// Last hovered cell
    pub fn hover(&self) -> Option<HoverTarget> {
        self.hover
    }

    /// Verdict a drop would commit right now
    pub fn last_result(&self) -> Option<&PlacementResult> {
        self.last_result.as_ref()
    }

    /// Whether the working footprint differs from the one at pick-up
    pub fn is_rotated(&self) -> bool {
        self.item.footprint != self.origin_footprint
    }

    pub(crate) fn rotate(&mut self) {
        self.item.footprint.rotate();
        self.last_result = None;
    }

    pub(crate) fn update(&mut self, hover: Option<HoverTarget>, result: PlacementResult) {
        self.hover = hover;
        self.last_result = Some(result);
    }
}

/// Source and target of a commit, borrowed together from one container map
pub(crate) enum Endpoints<'a> {
    Same(&'a mut Box<dyn DropTarget>),
    Split {
        source: &'a mut Box<dyn DropTarget>,
        target: &'a mut Box<dyn DropTarget>,
    },
}

impl<'a> Endpoints<'a> {
    /// Borrow `source` and `target` out of the map at once
    pub(crate) fn borrow(
        containers: &'a mut BTreeMap<ContainerId, Box<dyn DropTarget>>,
        source: ContainerId,
        target: ContainerId,
    ) -> Result<Self> {
        if source == target {
            return containers
                .get_mut(&source)
                .map(Self::Same)
                .ok_or(InventoryError::ContainerNotFound(source));
        }

        let mut source_slot = None;
        let mut target_slot = None;
        for (id, container) in containers.iter_mut() {
            if *id == source {
                source_slot = Some(container);
            } else if *id == target {
                target_slot = Some(container);
            }
        }
        match (source_slot, target_slot) {
            (Some(source), Some(target)) => Ok(Self::Split { source, target }),
            (None, _) => Err(InventoryError::ContainerNotFound(source)),
            (_, None) => Err(InventoryError::ContainerNotFound(target)),
        }
    }

    pub(crate) fn is_same(&self) -> bool {
        matches!(self, Self::Same(_))
    }

    pub(crate) fn source(&mut self) -> &mut (dyn DropTarget + 'static) {
        match self {
            Self::Same(c) => &mut ***c,
            Self::Split { source, .. } => &mut ***source,
        }
    }

    pub(crate) fn target(&mut self) -> &mut (dyn DropTarget + 'static) {
        match self {
            Self::Same(c) => &mut ***c,
            Self::Split { target, .. } => &mut ***target,
        }
    }
}

/// Apply an accepted verdict. On error every container involved is back in
/// its pre-commit state.
pub(crate) fn commit(
    mut endpoints: Endpoints<'_>,
    ids: &IdGenerator,
    session: &DragSession,
    result: &PlacementResult,
) -> Result<DropOutcome> {
    let source_backup = endpoints.source().container().clone();
    let target_backup = (!endpoints.is_same()).then(|| endpoints.target().container().clone());

    let outcome = match result.verdict {
        PlacementVerdict::Clear => commit_place(&mut endpoints, ids, session, result),
        PlacementVerdict::StackAvailable => commit_stack(&mut endpoints, session, result),
        PlacementVerdict::SwapAvailable => commit_swap(&mut endpoints, ids, session, result),
        PlacementVerdict::OutOfBounds | PlacementVerdict::Intersects | PlacementVerdict::InvalidSlotType => {
            let reason = result
                .verdict
                .rejection()
                .map_or(CancelReason::NoVerdict, CancelReason::Rejected);
            return Ok(DropOutcome::Cancelled(reason));
        }
    };

    if outcome.is_err() {
        *endpoints.source().container_mut() = source_backup;
        if let Some(backup) = target_backup {
            *endpoints.target().container_mut() = backup;
        }
    }
    outcome
}

fn commit_place(
    endpoints: &mut Endpoints<'_>,
    ids: &IdGenerator,
    session: &DragSession,
    result: &PlacementResult,
) -> Result<DropOutcome> {
    let dragged = session.item();

    if endpoints.is_same() {
        let source = endpoints.source();
        source
            .container_mut()
            .relocate(dragged.id, result.position, dragged.footprint)?;
        return Ok(DropOutcome::Placed {
            item: dragged.id,
            container: source.id(),
            position: result.position,
        });
    }

    let moved = endpoints.source().remove_stored_item(dragged.id, RemovalReason::Relocated)?;
    let mut incoming = moved.transfer(ids.next());
    incoming.footprint = dragged.footprint;

    let target = endpoints.target();
    let item = target.drop_item(incoming, result.position)?;
    Ok(DropOutcome::Placed {
        item,
        container: target.id(),
        position: result.position,
    })
}

fn commit_stack(endpoints: &mut Endpoints<'_>, session: &DragSession, result: &PlacementResult) -> Result<DropOutcome> {
    let dragged = session.item();
    let into = occupant(result)?;

    // The source stack may have changed since pick-up
    let carried = endpoints
        .source()
        .item(dragged.id)
        .map(|live| live.current_stack)
        .ok_or(InventoryError::ItemNotFound(dragged.id))?;

    let remainder = endpoints.target().add_to_stack(into, carried)?;
    let moved = carried - remainder;
    if remainder == 0 {
        endpoints.source().remove_stored_item(dragged.id, RemovalReason::Consumed)?;
    } else if moved > 0 {
        endpoints.source().take_from_stack(dragged.id, moved)?;
    }

    Ok(DropOutcome::Stacked { into, moved, remainder })
}

fn commit_swap(
    endpoints: &mut Endpoints<'_>,
    ids: &IdGenerator,
    session: &DragSession,
    result: &PlacementResult,
) -> Result<DropOutcome> {
    let dragged = session.item();
    let same = endpoints.is_same();

    let displaced = endpoints
        .target()
        .remove_stored_item(occupant(result)?, RemovalReason::Relocated)?;
    let moving = endpoints.source().remove_stored_item(dragged.id, RemovalReason::Relocated)?;

    let mut placed = if same { moving } else { moving.transfer(ids.next()) };
    placed.footprint = dragged.footprint;
    let placed = endpoints.target().add_stored_item(placed, result.position)?;

    let displaced = if same { displaced } else { displaced.transfer(ids.next()) };
    let displaced = return_to_source(endpoints.source(), displaced, session.origin_position())?;

    let target = endpoints.target();
    target
        .container_mut()
        .push_event(InventoryEvent::ItemsSwapped { placed, displaced });
    target.finalize_drag();

    Ok(DropOutcome::Swapped {
        placed,
        displaced,
        container: target.id(),
    })
}

/// Put a displaced item at the dragged item's old cell, else the first free
/// spot of the source
fn return_to_source(
    source: &mut dyn DropTarget,
    mut displaced: ItemInstance,
    origin: GridCoordinate,
) -> Result<InstanceId> {
    if let Ok(id) = source.add_stored_item(displaced.clone(), origin) {
        return Ok(id);
    }

    let Some((position, footprint)) = source.container().find_fit(&displaced) else {
        log::warn!("{} has no room for swapped-out {}", source.id(), displaced.template_id);
        return Err(InventoryError::capacity(displaced));
    };
    displaced.footprint = footprint;
    match source.add_stored_item(displaced.clone(), position) {
        Ok(id) => Ok(id),
        Err(_) => Err(InventoryError::capacity(displaced)),
    }
}

fn occupant(result: &PlacementResult) -> Result<InstanceId> {
    result
        .overlap
        .ok_or_else(|| InventoryError::InvalidStack("verdict carries no occupant".into()))
}
