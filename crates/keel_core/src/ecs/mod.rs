// mod.rs - ECS module exports
//
// Runtime-described component system: the host hands the World a list of
// component field descriptors at construction; storage, queries, and
// systems are all driven by those descriptors.

mod archetype;
mod component;
mod entity;
mod error;
mod handle;
mod proxy;
mod query;
mod snapshot;
mod storage;
mod system_descriptor;
mod system_handle;
mod system_registration_error;
mod system_registry;
mod world;

// Public exports
pub use component::{ComponentDescriptor, FieldDescriptor, FieldKind, Value};
pub use entity::EntityId;
pub use error::EcsError;
pub use handle::EntityHandle;
pub use proxy::EntityProxy;
pub use snapshot::{ComponentSnapshot, FieldColumn};
pub use storage::{ColumnStore, FieldArray, FieldRef, Record};
pub use system_descriptor::SystemDescriptor;
pub use system_handle::SystemHandle;
pub use system_registration_error::SystemRegistrationError;
pub use system_registry::SystemFn;
pub use world::{World, WorldConfig, WorldStats};
