// handle.rs - Fluent entity handle
//
// Binds an entity id to the world and offers the component operations as
// chainable calls. Sugar over the World facade; tight loops use column
// references instead.

use crate::ecs::component::Value;
use crate::ecs::entity::EntityId;
use crate::ecs::error::EcsError;
use crate::ecs::storage::Record;
use crate::ecs::world::World;

/// A borrowed (world, entity) pair.
///
/// ```ignore
/// world.entity(e)
///     .add("Transform", &[("x", Value::F32(10.0))])?
///     .add("Velocity", &[("dx", Value::F32(1.0))])?;
/// ```
pub struct EntityHandle<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl<'w> EntityHandle<'w> {
    pub(crate) fn new(world: &'w mut World, id: EntityId) -> Self {
        Self { world, id }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn alive(&self) -> bool {
        self.world.alive(self.id)
    }

    pub fn has(&self, component: &str) -> bool {
        self.world.has(self.id, component)
    }

    pub fn add(self, component: &str, fields: &[(&str, Value)]) -> Result<Self, EcsError> {
        self.world.add(self.id, component, fields)?;
        Ok(self)
    }

    pub fn set(self, component: &str, fields: &[(&str, Value)]) -> Result<Self, EcsError> {
        self.world.set(self.id, component, fields)?;
        Ok(self)
    }

    pub fn update(self, component: &str, fields: &[(&str, Value)]) -> Result<Self, EcsError> {
        self.world.update(self.id, component, fields)?;
        Ok(self)
    }

    pub fn remove(self, component: &str) -> Result<Self, EcsError> {
        self.world.remove(self.id, component)?;
        Ok(self)
    }

    pub fn get(&mut self, component: &str) -> Result<&Record, EcsError> {
        self.world.get(self.id, component)
    }

    pub fn get_copy(&self, component: &str) -> Result<Record, EcsError> {
        self.world.get_copy(self.id, component)
    }

    /// Despawn the bound entity; consumes the handle.
    pub fn despawn(self) -> bool {
        self.world.despawn(self.id)
    }
}
