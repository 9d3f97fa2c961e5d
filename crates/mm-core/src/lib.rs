pub mod id;
pub mod layout;
pub mod mock;
pub mod model;
pub mod partition;
pub mod persist;
pub mod store;

pub use id::NodeId;
pub use layout::{GroupLayout, LayoutConfig, apply_layout, layout_partition};
pub use model::*;
pub use partition::Partition;
pub use persist::{BoardRepository, KeyValueStore, MemoryStore, PersistError, StorageError};
pub use store::NodeStore;
