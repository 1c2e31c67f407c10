//! Equipment slots

use crate::error::{InventoryError, Rejection, Result};
use crate::events::{InventoryEvent, RemovalReason};
use crate::grid::GridCoordinate;
use crate::id::{ContainerId, InstanceId};
use crate::inventory::{AddReport, Container};
use crate::item::{ItemCategory, ItemInstance};
use crate::target::{AcceptPolicy, DropTarget};
use serde::{Deserialize, Serialize};

/// Body location an equipment slot stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// Head armor (helmet, hat)
    Head,
    /// Chest armor
    Chest,
    /// Leg armor
    Legs,
    /// Foot armor (boots)
    Feet,
    /// Hand armor (gloves)
    Hands,
    /// Main hand weapon
    MainHand,
    /// Off hand (shield, second weapon)
    OffHand,
    /// Ring, amulet
    Accessory,
    /// Cape, backpack
    Back,
    /// Belt
    Belt,
    /// Custom slot
    Custom(u32),
}

impl SlotKind {
    /// Get all standard slots
    pub fn all_standard() -> Vec<Self> {
        vec![
            Self::Head,
            Self::Chest,
            Self::Legs,
            Self::Feet,
            Self::Hands,
            Self::MainHand,
            Self::OffHand,
            Self::Accessory,
            Self::Back,
            Self::Belt,
        ]
    }

    /// Check if this is a weapon slot
    pub fn is_weapon(&self) -> bool {
        matches!(self, Self::MainHand | Self::OffHand)
    }

    /// Check if this is an armor slot
    pub fn is_armor(&self) -> bool {
        matches!(self, Self::Head | Self::Chest | Self::Legs | Self::Feet | Self::Hands)
    }

    /// Policy a slot of this kind starts with
    pub fn default_policy(&self) -> AcceptPolicy {
        if self.is_weapon() {
            AcceptPolicy::Categories(vec![ItemCategory::Weapon])
        } else if self.is_armor() {
            AcceptPolicy::Categories(vec![ItemCategory::Armor])
        } else {
            AcceptPolicy::Any
        }
    }
}

/// Single-cell container holding one equipped item.
///
/// Any footprint fits, the slot only looks at its accept policy. Storing or
/// removing an item raises [`InventoryEvent::ItemEquipped`] or
/// [`InventoryEvent::ItemUnequipped`] next to the regular container events.
#[derive(Debug, Clone)]
pub struct EquipmentSlot {
    slot: Container,
    kind: SlotKind,
}

impl EquipmentSlot {
    /// Create an empty slot with the kind's default policy
    pub fn new(id: ContainerId, kind: SlotKind) -> Self {
        let slot = Container::slot(id)
            .with_name(format!("{kind:?}"))
            .with_policy(kind.default_policy());
        Self { slot, kind }
    }

    /// Replace the accept policy
    pub fn with_policy(mut self, policy: AcceptPolicy) -> Self {
        self.slot = self.slot.with_policy(policy);
        self
    }

    /// Body location
    pub fn slot_kind(&self) -> SlotKind {
        self.kind
    }

    /// Currently equipped item
    pub fn equipped(&self) -> Option<&ItemInstance> {
        self.slot.items().next()
    }

    /// Check if slot is occupied
    pub fn is_occupied(&self) -> bool {
        !self.slot.is_empty()
    }

    /// Equip an item.
    /// Returns previously equipped item if any
    pub fn equip(&mut self, item: ItemInstance) -> Result<Option<ItemInstance>> {
        if !self.slot.can_accept(&item) {
            log::warn!("{:?} slot refuses {}", self.kind, item.template_id);
            return Err(Rejection::InvalidSlotType.into());
        }
        if self.slot.contains(item.id) {
            return Err(InventoryError::DuplicateItem(item.id));
        }

        let previous = match self.equipped().map(|i| i.id) {
            Some(id) => Some(self.remove_stored_item(id, RemovalReason::Relocated)?),
            None => None,
        };
        self.add_stored_item(item, GridCoordinate::ORIGIN)?;
        Ok(previous)
    }

    /// Unequip the held item
    pub fn unequip(&mut self) -> Option<ItemInstance> {
        let id = self.equipped()?.id;
        self.remove_stored_item(id, RemovalReason::Relocated).ok()
    }
}

impl DropTarget for EquipmentSlot {
    fn container(&self) -> &Container {
        &self.slot
    }

    fn container_mut(&mut self) -> &mut Container {
        &mut self.slot
    }

    fn add_stored_item(&mut self, item: ItemInstance, position: GridCoordinate) -> Result<InstanceId> {
        let template_id = item.template_id.clone();
        let id = self.slot.add_item_at(item, position)?;
        log::debug!("{:?} slot equipped {} {}", self.kind, template_id, id);
        self.slot.push_event(InventoryEvent::ItemEquipped { item: id, template_id });
        Ok(id)
    }

    fn store_item(&mut self, item: ItemInstance) -> Result<AddReport> {
        if !self.slot.can_accept(&item) {
            return Err(Rejection::InvalidSlotType.into());
        }
        if self.is_occupied() {
            return Err(InventoryError::capacity(item));
        }
        let id = self.add_stored_item(item, GridCoordinate::ORIGIN)?;
        Ok(AddReport {
            merged: Vec::new(),
            placed: Some((id, GridCoordinate::ORIGIN)),
        })
    }

    fn remove_stored_item(&mut self, id: InstanceId, reason: RemovalReason) -> Result<ItemInstance> {
        let item = self.slot.remove_item(id, reason)?;
        log::debug!("{:?} slot unequipped {} {}", self.kind, item.template_id, id);
        self.slot.push_event(InventoryEvent::ItemUnequipped {
            item: id,
            template_id: item.template_id.clone(),
        });
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdGenerator;
    use crate::item::ItemTemplate;
    use crate::placement::PlacementVerdict;

    fn helmet(ids: &IdGenerator, name: &str) -> ItemInstance {
        ItemTemplate::new(name, name)
            .with_category(ItemCategory::Armor)
            .with_size(2, 2)
            .instantiate(ids.next(), 1)
    }

    #[test]
    fn test_equip_returns_previous() {
        let ids = IdGenerator::new();
        let mut head = EquipmentSlot::new(ContainerId(1), SlotKind::Head);

        assert!(head.equip(helmet(&ids, "iron_helm")).unwrap().is_none());
        assert!(head.is_occupied());

        let previous = head.equip(helmet(&ids, "steel_helm")).unwrap().unwrap();
        assert_eq!(previous.template_id, "iron_helm");
        assert_eq!(head.equipped().unwrap().template_id, "steel_helm");
        assert_eq!(head.container().len(), 1);
    }

    #[test]
    fn test_slot_policy() {
        let ids = IdGenerator::new();
        let mut hand = EquipmentSlot::new(ContainerId(2), SlotKind::MainHand);

        let err = hand.equip(helmet(&ids, "iron_helm")).unwrap_err();
        assert!(matches!(err, InventoryError::PlacementRejected(Rejection::InvalidSlotType)));
        assert!(!hand.is_occupied());

        let mut ring = EquipmentSlot::new(ContainerId(3), SlotKind::Accessory);
        assert!(ring.equip(helmet(&ids, "odd_hat")).is_ok());
    }

    #[test]
    fn test_equip_events() {
        let ids = IdGenerator::new();
        let mut head = EquipmentSlot::new(ContainerId(1), SlotKind::Head);
        let helm = helmet(&ids, "iron_helm");
        let helm_id = helm.id;

        head.equip(helm).unwrap();
        head.unequip().unwrap();

        let events = head.drain_events();
        assert!(events.contains(&InventoryEvent::ItemEquipped {
            item: helm_id,
            template_id: "iron_helm".into(),
        }));
        assert!(events.contains(&InventoryEvent::ItemUnequipped {
            item: helm_id,
            template_id: "iron_helm".into(),
        }));
        assert!(head.unequip().is_none());
    }

    #[test]
    fn test_occupied_slot_offers_swap() {
        let ids = IdGenerator::new();
        let mut head = EquipmentSlot::new(ContainerId(1), SlotKind::Head);
        head.equip(helmet(&ids, "iron_helm")).unwrap();

        let result = head.show_placement_target(&helmet(&ids, "steel_helm"), GridCoordinate::new(4, 4));
        assert_eq!(result.verdict, PlacementVerdict::SwapAvailable);
        assert_eq!(result.position, GridCoordinate::ORIGIN);
        assert_eq!(result.overlap, head.equipped().map(|i| i.id));
    }
}
