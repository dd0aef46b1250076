use crate::ecs::entity::EntityId;
use thiserror::Error;

/// Errors surfaced by World operations.
///
/// A rejected call never leaves the World inconsistent; there is nothing to
/// retry internally, so every variant propagates to the caller.
#[derive(Debug, Error)]
pub enum EcsError {
    #[error("entity capacity exceeded (max_entities = {capacity})")]
    CapacityExceeded { capacity: usize },

    #[error("unknown component '{name}' (registered: {registered})")]
    UnknownComponent { name: String, registered: String },

    #[error("entity {entity} does not have component '{component}' (present: {present})")]
    MissingComponent {
        entity: EntityId,
        component: String,
        present: String,
    },

    #[error("entity {entity} is not alive")]
    DeadEntity { entity: EntityId },

    #[error("component '{component}' has no field '{field}'")]
    UnknownField { component: String, field: String },

    #[error("duplicate component name '{name}' in world configuration")]
    DuplicateComponent { name: String },

    #[error("duplicate field name '{field}' on component '{component}'")]
    DuplicateField { component: String, field: String },

    #[error("max_entities must be at least 1")]
    ZeroCapacity,

    #[error("snapshot decoding is not implemented")]
    SnapshotDecodeUnimplemented,
}
