//! Save/load seam for container contents

use crate::error::Result;
use crate::id::{ContainerId, InstanceId};
use crate::item::ItemInstance;
use crate::target::{ContainerKind, DropTarget};
use serde::{Deserialize, Serialize};

/// Serialized form of one container's items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    /// Container the items were saved from
    pub container: ContainerId,
    /// Geometry at save time
    pub kind: ContainerKind,
    /// Grid width at save time
    pub columns: u32,
    /// Grid height at save time
    pub rows: u32,
    /// Items in insertion order, with positions and rotation
    pub items: Vec<ItemInstance>,
}

impl ContainerSnapshot {
    /// Capture a container's current contents
    pub fn capture(target: &dyn DropTarget) -> Self {
        Self {
            container: target.id(),
            kind: target.kind(),
            columns: target.grid().columns(),
            rows: target.grid().rows(),
            items: target.contents(),
        }
    }

    /// Store key for a container
    pub fn key_for(container: ContainerId) -> String {
        format!("container_{}", container.0)
    }

    /// Store key of this snapshot
    pub fn key(&self) -> String {
        Self::key_for(self.container)
    }

    /// Highest instance id in the snapshot
    pub fn max_instance_id(&self) -> Option<InstanceId> {
        self.items.iter().map(|i| i.id).max()
    }
}

/// Keyed storage for container snapshots
pub trait ContainerStore: Send {
    /// Write a snapshot, replacing any previous one under `key`
    fn save(&mut self, key: &str, snapshot: &ContainerSnapshot) -> Result<()>;

    /// Read a snapshot, `None` if nothing is stored under `key`
    fn load(&self, key: &str) -> Result<Option<ContainerSnapshot>>;

    /// Delete a snapshot. Returns whether anything was deleted.
    fn delete(&mut self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use crate::grid::GridCoordinate;
    use crate::id::IdGenerator;
    use crate::inventory::Container;
    use crate::item::ItemTemplate;

    #[test]
    fn test_capture_and_json() {
        let ids = IdGenerator::new();
        let mut pack = Container::new(ContainerId(4), ContainerConfig::grid(3, 2));
        let mut rifle = ItemTemplate::new("rifle", "Rifle").with_size(1, 2).instantiate(ids.next(), 1);
        rifle.footprint.rotate();
        pack.add_item_at(rifle, GridCoordinate::new(1, 1)).unwrap();
        pack.add_item_at(ItemTemplate::new("gem", "Gem").instantiate(ids.next(), 1), GridCoordinate::ORIGIN)
            .unwrap();

        let snapshot = ContainerSnapshot::capture(&pack);
        assert_eq!(snapshot.key(), "container_4");
        assert_eq!((snapshot.columns, snapshot.rows), (3, 2));
        assert_eq!(snapshot.max_instance_id(), Some(InstanceId::from_raw(2)));

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: ContainerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);

        let mut restored = Container::new(ContainerId(4), ContainerConfig::grid(3, 2));
        restored.set_contents(parsed.items).unwrap();
        assert_eq!(restored.grid(), pack.grid());
        assert_eq!(restored.items().next().unwrap().footprint.width(), 2);
    }
}
