//! Conflict resolution for candidate placements
//!
//! [`PlacementResolver::resolve`] is a pure query over a drop target's grid
//! and policy hooks. It is called on every hover update while dragging, so it must stay
//! cheap and must never mutate anything.

use crate::error::Rejection;
use crate::grid::GridCoordinate;
use crate::id::{ContainerId, InstanceId};
use crate::item::ItemInstance;
use crate::target::{ContainerKind, DropTarget};

/// Outcome of evaluating a candidate placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementVerdict {
    /// No overlap, inside the grid, accepted by policy
    Clear,
    /// Area leaves the grid, or nothing is hovered
    OutOfBounds,
    /// Overlap that can be neither merged nor swapped
    Intersects,
    /// Container policy refuses the item
    InvalidSlotType,
    /// Single occupant that can trade places with the dragged item
    SwapAvailable,
    /// Single same-template occupant with spare stack capacity
    StackAvailable,
}

impl PlacementVerdict {
    /// Whether dropping with this verdict commits something
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Clear | Self::SwapAvailable | Self::StackAvailable)
    }

    /// The rejection reason, if this verdict cancels a drop
    pub fn rejection(self) -> Option<Rejection> {
        match self {
            Self::OutOfBounds => Some(Rejection::OutOfBounds),
            Self::Intersects => Some(Rejection::Intersects),
            Self::InvalidSlotType => Some(Rejection::InvalidSlotType),
            Self::Clear | Self::SwapAvailable | Self::StackAvailable => None,
        }
    }
}

/// Verdict plus the data a drop needs to commit it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementResult {
    /// The verdict
    pub verdict: PlacementVerdict,
    /// Top-left cell the item would occupy (slots normalize to the origin)
    pub position: GridCoordinate,
    /// The single occupant involved in a swap or stack
    pub overlap: Option<InstanceId>,
    /// Hovered container
    pub target: Option<ContainerId>,
}

impl PlacementResult {
    fn new(verdict: PlacementVerdict, position: GridCoordinate, target: Option<ContainerId>) -> Self {
        Self {
            verdict,
            position,
            overlap: None,
            target,
        }
    }

    fn with_overlap(mut self, overlap: InstanceId) -> Self {
        self.overlap = Some(overlap);
        self
    }

    /// Result for a pointer that is over no container at all
    pub fn nowhere() -> Self {
        Self::new(PlacementVerdict::OutOfBounds, GridCoordinate::ORIGIN, None)
    }
}

/// Inputs of one resolver evaluation
#[derive(Clone, Copy)]
pub struct PlacementQuery<'a> {
    /// Dragged item, carrying its current (possibly rotated) footprint
    pub item: &'a ItemInstance,
    /// Hovered container and cell
    pub target: Option<(&'a dyn DropTarget, GridCoordinate)>,
    /// Container the item was picked up from, consulted for swap-back policy
    pub origin: Option<&'a dyn DropTarget>,
}

impl<'a> PlacementQuery<'a> {
    /// Query for an item hovering nothing
    pub fn new(item: &'a ItemInstance) -> Self {
        Self {
            item,
            target: None,
            origin: None,
        }
    }

    /// Hover a cell of a container
    pub fn over(mut self, target: &'a dyn DropTarget, cell: GridCoordinate) -> Self {
        self.target = Some((target, cell));
        self
    }

    /// Record where the item came from
    pub fn from_origin(mut self, origin: &'a dyn DropTarget) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// Computes placement verdicts
pub struct PlacementResolver;

impl PlacementResolver {
    /// Evaluate a candidate placement. First matching rule wins:
    /// policy, bounds, then the set of overlapped occupants.
    pub fn resolve(query: &PlacementQuery<'_>) -> PlacementResult {
        match query.target {
            Some((target, cell)) => Self::evaluate(query.item, target, cell, query.origin),
            None => PlacementResult::nowhere(),
        }
    }

    /// Evaluate `item` over `cell` of `target` with no origin to swap back to
    pub fn resolve_over<T: DropTarget + ?Sized>(
        item: &ItemInstance,
        target: &T,
        cell: GridCoordinate,
    ) -> PlacementResult {
        Self::evaluate(item, target, cell, None)
    }

    fn evaluate<T: DropTarget + ?Sized>(
        item: &ItemInstance,
        target: &T,
        cell: GridCoordinate,
        origin: Option<&dyn DropTarget>,
    ) -> PlacementResult {
        let (position, footprint) = target.container().placement_area(item, cell);
        let target_id = Some(target.id());

        if !target.can_accept(item) {
            return PlacementResult::new(PlacementVerdict::InvalidSlotType, position, target_id);
        }

        if !target.grid().contains_area(position, &footprint) {
            return PlacementResult::new(PlacementVerdict::OutOfBounds, position, target_id);
        }

        let occupants = target.grid().occupants(position, &footprint, Some(item.id));
        let occupant_id = match occupants.as_slice() {
            [] => return PlacementResult::new(PlacementVerdict::Clear, position, target_id),
            [single] => *single,
            _ => return PlacementResult::new(PlacementVerdict::Intersects, position, target_id),
        };

        let Some(occupant) = target.item(occupant_id) else {
            log::warn!("{} has cells held by unknown item {}", target.id(), occupant_id);
            return PlacementResult::new(PlacementVerdict::Intersects, position, target_id);
        };

        let verdict = if target.kind() == ContainerKind::Slot {
            PlacementVerdict::SwapAvailable
        } else if target.allows_stacking()
            && occupant.can_merge(item)
            && occupant.spare_capacity() > 0
        {
            PlacementVerdict::StackAvailable
        } else if target.allows_swap()
            && origin.map_or(true, |origin| origin.can_accept(occupant))
        {
            PlacementVerdict::SwapAvailable
        } else {
            PlacementVerdict::Intersects
        };

        PlacementResult::new(verdict, position, target_id).with_overlap(occupant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use crate::id::IdGenerator;
    use crate::inventory::Container;
    use crate::item::{ItemCategory, ItemTemplate};
    use crate::target::AcceptPolicy;

    /// Refuses quest items and swaps through the trait hooks only
    #[derive(Debug)]
    struct Locker(Container);

    impl DropTarget for Locker {
        fn container(&self) -> &Container {
            &self.0
        }

        fn container_mut(&mut self) -> &mut Container {
            &mut self.0
        }

        fn can_accept(&self, item: &ItemInstance) -> bool {
            item.category != ItemCategory::Quest
        }

        fn allows_swap(&self) -> bool {
            false
        }
    }

    fn at(x: i32, y: i32) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    fn verdict_of(item: &ItemInstance, target: &dyn DropTarget, cell: GridCoordinate) -> PlacementVerdict {
        PlacementResolver::resolve(&PlacementQuery::new(item).over(target, cell)).verdict
    }

    #[test]
    fn test_bounds_scenario() {
        let ids = IdGenerator::new();
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(4, 4).without_swap());

        let bar = ItemTemplate::new("bar", "Bar").with_size(2, 1).instantiate(ids.next(), 1);
        let bar_id = grid.add_item_at(bar, at(0, 0)).unwrap();
        assert_eq!(grid.grid().at(at(0, 0)), Some(bar_id));
        assert_eq!(grid.grid().at(at(1, 0)), Some(bar_id));

        let gem = ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1);
        assert_eq!(verdict_of(&gem, &grid, at(0, 0)), PlacementVerdict::Intersects);

        let mut tall = ItemTemplate::new("staff", "Staff").with_size(2, 1).instantiate(ids.next(), 1);
        tall.footprint.rotate();
        assert_eq!((tall.footprint.width(), tall.footprint.height()), (1, 2));
        assert_eq!(verdict_of(&tall, &grid, at(3, 3)), PlacementVerdict::OutOfBounds);
        assert_eq!(verdict_of(&tall, &grid, at(3, 2)), PlacementVerdict::Clear);
        assert_eq!(verdict_of(&tall, &grid, at(-1, 0)), PlacementVerdict::OutOfBounds);
    }

    #[test]
    fn test_swap_and_stack() {
        let ids = IdGenerator::new();
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(4, 4));
        let arrows = ItemTemplate::new("arrow", "Arrow").with_max_stack(20);
        let sword = ItemTemplate::new("sword", "Sword");

        let sword_id = grid.add_item_at(sword.instantiate(ids.next(), 1), at(0, 0)).unwrap();
        let arrows_id = grid.add_item_at(arrows.instantiate(ids.next(), 15), at(2, 0)).unwrap();

        let shield = ItemTemplate::new("shield", "Shield").instantiate(ids.next(), 1);
        let result = PlacementResolver::resolve(&PlacementQuery::new(&shield).over(&grid, at(0, 0)));
        assert_eq!(result.verdict, PlacementVerdict::SwapAvailable);
        assert_eq!(result.overlap, Some(sword_id));
        assert_eq!(result.target, Some(ContainerId(1)));

        let more_arrows = arrows.instantiate(ids.next(), 10);
        let result = PlacementResolver::resolve(&PlacementQuery::new(&more_arrows).over(&grid, at(2, 0)));
        assert_eq!(result.verdict, PlacementVerdict::StackAvailable);
        assert_eq!(result.overlap, Some(arrows_id));
    }

    #[test]
    fn test_full_stack_is_swapped_not_stacked() {
        let ids = IdGenerator::new();
        let coins = ItemTemplate::new("coin", "Coin").with_max_stack(50);
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(2, 2));
        grid.add_item_at(coins.instantiate(ids.next(), 50), at(0, 0)).unwrap();
        let mut locked = Container::new(ContainerId(2), ContainerConfig::grid(2, 2).without_swap());
        locked.add_item_at(coins.instantiate(ids.next(), 50), at(0, 0)).unwrap();

        let dragged = coins.instantiate(ids.next(), 3);
        assert_eq!(verdict_of(&dragged, &grid, at(0, 0)), PlacementVerdict::SwapAvailable);
        assert_eq!(verdict_of(&dragged, &locked, at(0, 0)), PlacementVerdict::Intersects);
    }

    #[test]
    fn test_multiple_occupants_intersect() {
        let ids = IdGenerator::new();
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(4, 4));
        let gem = ItemTemplate::new("gem", "Gem");
        grid.add_item_at(gem.instantiate(ids.next(), 1), at(0, 0)).unwrap();
        grid.add_item_at(gem.instantiate(ids.next(), 1), at(1, 0)).unwrap();

        let plank = ItemTemplate::new("plank", "Plank").with_size(2, 1).instantiate(ids.next(), 1);
        let result = PlacementResolver::resolve(&PlacementQuery::new(&plank).over(&grid, at(0, 0)));
        assert_eq!(result.verdict, PlacementVerdict::Intersects);
        assert_eq!(result.overlap, None);
    }

    #[test]
    fn test_policy_checked_before_geometry() {
        let ids = IdGenerator::new();
        let grid = Container::new(ContainerId(1), ContainerConfig::grid(2, 2))
            .with_policy(AcceptPolicy::Categories(vec![ItemCategory::Ammo]));

        let sword = ItemTemplate::new("sword", "Sword")
            .with_category(ItemCategory::Weapon)
            .instantiate(ids.next(), 1);
        assert_eq!(verdict_of(&sword, &grid, at(9, 9)), PlacementVerdict::InvalidSlotType);
    }

    #[test]
    fn test_dragged_item_ignores_its_own_cells() {
        let ids = IdGenerator::new();
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(4, 1));
        let plank = ItemTemplate::new("plank", "Plank").with_size(2, 1).instantiate(ids.next(), 1);
        let id = grid.add_item_at(plank, at(0, 0)).unwrap();

        let dragged = grid.item(id).unwrap().clone();
        assert_eq!(verdict_of(&dragged, &grid, at(1, 0)), PlacementVerdict::Clear);
    }

    #[test]
    fn test_origin_policy_blocks_swap() {
        let ids = IdGenerator::new();
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(2, 2));
        let rock = ItemTemplate::new("rock", "Rock").instantiate(ids.next(), 1);
        grid.add_item_at(rock, at(0, 0)).unwrap();

        let quiver = Container::new(ContainerId(2), ContainerConfig::grid(1, 1))
            .with_policy(AcceptPolicy::Categories(vec![ItemCategory::Ammo]));
        let arrow = ItemTemplate::new("arrow", "Arrow")
            .with_category(ItemCategory::Ammo)
            .instantiate(ids.next(), 1);

        let query = PlacementQuery::new(&arrow).over(&grid, at(0, 0)).from_origin(&quiver);
        assert_eq!(PlacementResolver::resolve(&query).verdict, PlacementVerdict::Intersects);
    }

    #[test]
    fn test_nothing_hovered() {
        let ids = IdGenerator::new();
        let gem = ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1);
        let result = PlacementResolver::resolve(&PlacementQuery::new(&gem));
        assert_eq!(result, PlacementResult::nowhere());
        assert_eq!(result.verdict.rejection(), Some(Rejection::OutOfBounds));
    }

    #[test]
    fn test_resolver_is_idempotent() {
        let ids = IdGenerator::new();
        let mut grid = Container::new(ContainerId(1), ContainerConfig::grid(3, 3));
        grid.add_item_at(ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1), at(1, 1))
            .unwrap();
        let plank = ItemTemplate::new("plank", "Plank").with_size(2, 2).instantiate(ids.next(), 1);

        for x in -1..3 {
            for y in -1..3 {
                let query = PlacementQuery::new(&plank).over(&grid, at(x, y));
                assert_eq!(PlacementResolver::resolve(&query), PlacementResolver::resolve(&query));
            }
        }
    }

    #[test]
    fn test_target_overrides_are_honored() {
        let ids = IdGenerator::new();
        let rock = ItemTemplate::new("rock", "Rock").instantiate(ids.next(), 1);
        let gem = ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1);
        let letter = ItemTemplate::new("letter", "Letter")
            .with_category(ItemCategory::Quest)
            .instantiate(ids.next(), 1);

        let mut inner = Container::new(ContainerId(1), ContainerConfig::grid(2, 2));
        inner.add_item_at(rock, at(0, 0)).unwrap();
        assert_eq!(verdict_of(&gem, &inner, at(0, 0)), PlacementVerdict::SwapAvailable);
        assert_eq!(verdict_of(&letter, &inner, at(1, 1)), PlacementVerdict::Clear);

        let mut locker = Locker(inner);
        assert_eq!(verdict_of(&gem, &locker, at(0, 0)), PlacementVerdict::Intersects);
        assert_eq!(verdict_of(&letter, &locker, at(1, 1)), PlacementVerdict::InvalidSlotType);
        assert_eq!(
            locker.show_placement_target(&letter, at(1, 1)).verdict,
            PlacementVerdict::InvalidSlotType
        );

        // Swapping a quest item back into the locker is refused too
        let mut desk = Container::new(ContainerId(2), ContainerConfig::grid(1, 1));
        desk.add_item_at(letter, at(0, 0)).unwrap();
        let plain = Container::new(ContainerId(3), ContainerConfig::grid(1, 1));
        let from_locker = PlacementQuery::new(&gem).over(&desk, at(0, 0)).from_origin(&locker);
        let from_plain = PlacementQuery::new(&gem).over(&desk, at(0, 0)).from_origin(&plain);
        assert_eq!(PlacementResolver::resolve(&from_locker).verdict, PlacementVerdict::Intersects);
        assert_eq!(PlacementResolver::resolve(&from_plain).verdict, PlacementVerdict::SwapAvailable);
    }
}
