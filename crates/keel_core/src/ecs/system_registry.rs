use crate::ecs::proxy::EntityProxy;
use crate::ecs::system_handle::SystemHandle;
use crate::ecs::world::World;
use std::collections::HashMap;

/// Per-entity system callback. Receives the reusable proxy (with `eid`
/// already assigned), the tick delta, and the world for cross-entity reads
/// and structural operations.
pub type SystemFn = Box<dyn FnMut(&mut EntityProxy, f32, &mut World)>;

/// A fully resolved system: precomputed query key and required-mask, the
/// reusable proxy, and the callback. Built by `World::register_system`.
pub(crate) struct RegisteredSystem {
    pub(crate) name: String,
    pub(crate) key: String,
    pub(crate) mask: Box<[u32]>,
    pub(crate) proxy: EntityProxy,
    pub(crate) callback: SystemFn,
}

pub(crate) struct SystemRegistry {
    systems: Vec<RegisteredSystem>,
    name_lookup: HashMap<String, SystemHandle>,
}

impl SystemRegistry {
    pub(crate) fn new() -> Self {
        Self {
            systems: Vec::new(),
            name_lookup: HashMap::new(),
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.name_lookup.contains_key(name)
    }

    /// Append a resolved system; execution order is registration order.
    pub(crate) fn register(&mut self, system: RegisteredSystem) -> SystemHandle {
        let handle = SystemHandle::new(self.systems.len() as u32);
        self.name_lookup.insert(system.name.clone(), handle);
        self.systems.push(system);
        handle
    }

    pub(crate) fn len(&self) -> usize {
        self.systems.len()
    }

    /// Move the system list out for the duration of a tick. Registration
    /// from inside a callback is unsupported while detached.
    pub(crate) fn detach(&mut self) -> Vec<RegisteredSystem> {
        std::mem::take(&mut self.systems)
    }

    pub(crate) fn reattach(&mut self, systems: Vec<RegisteredSystem>) {
        self.systems = systems;
    }
}
