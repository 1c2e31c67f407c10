//! Void GameState - Container persistence for Void Engine inventories
//!
//! Implementations of [`void_inventory::ContainerStore`]:
//! - [`MemoryStore`] keeps encoded snapshots in memory
//! - [`FileStore`] writes one file per container into a save directory
//!
//! Both wrap each snapshot in a versioned [`SaveEnvelope`] and encode it as
//! JSON or bincode depending on [`SaveFormat`].

pub mod file;
pub mod memory;
pub mod save;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use save::{SaveEnvelope, SaveError, SaveFormat, SaveHeader, SAVE_VERSION};

/// Prelude
pub mod prelude {
    pub use crate::file::FileStore;
    pub use crate::memory::MemoryStore;
    pub use crate::save::{SaveEnvelope, SaveError, SaveFormat, SaveHeader, SAVE_VERSION};
}
