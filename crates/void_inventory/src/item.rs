//! Item templates and live item instances

use crate::grid::{Footprint, GridCoordinate};
use crate::id::InstanceId;
use serde::{Deserialize, Serialize};

/// Item category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Weapons (swords, bows, etc.)
    Weapon,
    /// Armor pieces
    Armor,
    /// Consumables (potions, food, etc.)
    Consumable,
    /// Materials for crafting
    Material,
    /// Quest items
    Quest,
    /// Key items
    Key,
    /// Ammunition
    Ammo,
    /// Currency
    Currency,
    /// Misc items
    #[default]
    Misc,
    /// Custom category
    Custom(u32),
}

/// Read-only item definition that instances are cloned from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category
    #[serde(default)]
    pub category: ItemCategory,
    /// Width in cells at 0 degrees
    #[serde(default = "one")]
    pub width: u32,
    /// Height in cells at 0 degrees
    #[serde(default = "one")]
    pub height: u32,
    /// Maximum stack size (1 = not stackable)
    #[serde(default = "one")]
    pub max_stack: u32,
    /// Icon path handed to the rendering layer
    #[serde(default)]
    pub icon: String,
    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,
}

fn one() -> u32 {
    1
}

impl ItemTemplate {
    /// Create a new 1x1, non-stackable template
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: ItemCategory::default(),
            width: 1,
            height: 1,
            max_stack: 1,
            icon: String::new(),
            tags: Vec::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set category
    pub fn with_category(mut self, category: ItemCategory) -> Self {
        self.category = category;
        self
    }

    /// Set size in cells
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    /// Set max stack size
    pub fn with_max_stack(mut self, max: u32) -> Self {
        self.max_stack = max.max(1);
        self
    }

    /// Set icon path
    pub fn with_icon(mut self, path: impl Into<String>) -> Self {
        self.icon = path.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Check if item has a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Check if stackable
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }

    /// Unrotated footprint
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.width, self.height)
    }

    /// Clone this definition into a fresh, unplaced instance.
    ///
    /// `quantity` is clamped to `1..=max_stack`.
    pub fn instantiate(&self, id: InstanceId, quantity: u32) -> ItemInstance {
        ItemInstance {
            id,
            template_id: self.id.clone(),
            category: self.category,
            max_stack: self.max_stack.max(1),
            current_stack: quantity.clamp(1, self.max_stack.max(1)),
            footprint: self.footprint(),
            icon: self.icon.clone(),
            position: None,
        }
    }
}

/// One live item held by a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Instance identity
    pub id: InstanceId,
    /// Template identity, shared by every instance of the same item
    pub template_id: String,
    /// Category copied from the template
    pub category: ItemCategory,
    /// Maximum stack size (1 = not stackable)
    pub max_stack: u32,
    /// Current stack size
    pub current_stack: u32,
    /// Current footprint (may be rotated)
    pub footprint: Footprint,
    /// Icon path handed to the rendering layer
    pub icon: String,
    /// Top-left cell under the current footprint, while placed
    pub position: Option<GridCoordinate>,
}

impl ItemInstance {
    /// Check if stackable
    pub fn is_stackable(&self) -> bool {
        self.max_stack > 1
    }

    /// Room left on this stack
    pub fn spare_capacity(&self) -> u32 {
        if self.is_stackable() {
            self.max_stack.saturating_sub(self.current_stack)
        } else {
            0
        }
    }

    /// Whether `other` may be merged into this stack
    pub fn can_merge(&self, other: &ItemInstance) -> bool {
        self.template_id == other.template_id && self.is_stackable() && other.is_stackable()
    }

    /// Add to this stack, clamped to `max_stack`. Returns the remainder.
    pub fn add_stack(&mut self, amount: u32) -> u32 {
        let to_add = amount.min(self.spare_capacity());
        self.current_stack += to_add;
        amount - to_add
    }

    /// Remove from this stack. Returns the amount actually removed.
    pub fn remove_stack(&mut self, amount: u32) -> u32 {
        let to_remove = amount.min(self.current_stack);
        self.current_stack -= to_remove;
        to_remove
    }

    /// Whether the stack is used up
    pub fn is_depleted(&self) -> bool {
        self.current_stack == 0
    }

    /// Split `amount` off into a new, unplaced instance
    pub fn split(&mut self, amount: u32, new_id: InstanceId) -> Option<ItemInstance> {
        if !self.is_stackable() || amount == 0 || amount >= self.current_stack {
            return None;
        }
        self.current_stack -= amount;
        let mut split = self.transfer(new_id);
        split.current_stack = amount;
        split.footprint.reset();
        Some(split)
    }

    /// First broken stack or footprint invariant, if any. Used to vet
    /// instances coming back from storage.
    pub fn invariant_violation(&self) -> Option<String> {
        if self.max_stack == 0 {
            return Some(format!("{} has a max stack of zero", self.id));
        }
        if self.current_stack == 0 || self.current_stack > self.max_stack {
            return Some(format!(
                "{} holds {} of at most {}",
                self.id, self.current_stack, self.max_stack
            ));
        }
        if !self.footprint.is_consistent() {
            return Some(format!("{} has a footprint that does not match its angle", self.id));
        }
        None
    }

    /// Fresh, unplaced copy for another container.
    ///
    /// Keeps stack count and rotation; only the identity and position change,
    /// so containers never alias one mutable instance.
    pub fn transfer(&self, new_id: InstanceId) -> ItemInstance {
        ItemInstance {
            id: new_id,
            position: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn potion() -> ItemTemplate {
        ItemTemplate::new("health_potion", "Health Potion")
            .with_category(ItemCategory::Consumable)
            .with_max_stack(10)
    }

    #[test]
    fn test_item_template() {
        let item = ItemTemplate::new("long_bow", "Long Bow")
            .with_category(ItemCategory::Weapon)
            .with_size(1, 4)
            .with_tag("two_handed");

        assert_eq!(item.id, "long_bow");
        assert!(!item.is_stackable());
        assert!(item.has_tag("two_handed"));
        assert_eq!(item.footprint().height(), 4);
    }

    #[test]
    fn test_instantiate_clamps_quantity() {
        let template = potion();
        let ids = crate::id::IdGenerator::new();

        assert_eq!(template.instantiate(ids.next(), 0).current_stack, 1);
        assert_eq!(template.instantiate(ids.next(), 25).current_stack, 10);

        let sword = ItemTemplate::new("sword", "Sword").instantiate(ids.next(), 5);
        assert_eq!(sword.current_stack, 1);
        assert_eq!(sword.position, None);
    }

    #[test]
    fn test_stack_arithmetic() {
        let ids = crate::id::IdGenerator::new();
        let mut stack = potion().instantiate(ids.next(), 7);

        assert_eq!(stack.add_stack(5), 2);
        assert_eq!(stack.current_stack, 10);

        let mut stack = potion().instantiate(ids.next(), 7);
        assert_eq!(stack.add_stack(2), 0);
        assert_eq!(stack.current_stack, 9);

        assert_eq!(stack.remove_stack(20), 9);
        assert!(stack.is_depleted());
    }

    #[test]
    fn test_non_stackable_has_no_capacity() {
        let ids = crate::id::IdGenerator::new();
        let mut sword = ItemTemplate::new("sword", "Sword").instantiate(ids.next(), 1);

        assert_eq!(sword.spare_capacity(), 0);
        assert_eq!(sword.add_stack(3), 3);
        assert!(!sword.can_merge(&sword.clone()));
    }

    #[test]
    fn test_split() {
        let ids = crate::id::IdGenerator::new();
        let mut stack = potion().instantiate(ids.next(), 8);

        let split = stack.split(3, ids.next()).unwrap();
        assert_eq!(stack.current_stack, 5);
        assert_eq!(split.current_stack, 3);
        assert_ne!(split.id, stack.id);

        assert!(stack.split(5, ids.next()).is_none());
        assert!(stack.split(0, ids.next()).is_none());
    }

    #[test]
    fn test_transfer_preserves_state_but_not_identity() {
        let ids = crate::id::IdGenerator::new();
        let mut item = ItemTemplate::new("rifle", "Rifle")
            .with_size(4, 1)
            .instantiate(ids.next(), 1);
        item.footprint.rotate();
        item.position = Some(GridCoordinate::new(2, 0));

        let moved = item.transfer(ids.next());
        assert_ne!(moved.id, item.id);
        assert_eq!(moved.footprint, item.footprint);
        assert_eq!(moved.current_stack, item.current_stack);
        assert_eq!(moved.position, None);
    }
}
