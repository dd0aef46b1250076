// world.rs - The ECS world: entity lifecycle, component data, queries,
// systems
//
// A World is built once from a capacity and an ordered list of component
// descriptors, then owns everything: column stores, the entity allocator,
// the archetype bitmasks, the query cache, and the system registry. All
// per-entity arrays are sized to capacity up front; gameplay operations
// allocate nothing.
//
// Concurrency contract: a World belongs to one thread of control. A tick
// is a non-preemptive sequence of system invocations in registration
// order; effects of earlier systems are visible to later ones within the
// same tick.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ecs::archetype::{required_mask, ArchetypeMasks};
use crate::ecs::component::{ComponentDescriptor, Value};
use crate::ecs::entity::{EntityAllocator, EntityId};
use crate::ecs::error::EcsError;
use crate::ecs::handle::EntityHandle;
use crate::ecs::proxy::EntityProxy;
use crate::ecs::query::{canonical_key, QueryCache};
use crate::ecs::snapshot::{ComponentSnapshot, FieldColumn};
use crate::ecs::storage::{ColumnStore, FieldRef, Record};
use crate::ecs::system_descriptor::SystemDescriptor;
use crate::ecs::system_handle::SystemHandle;
use crate::ecs::system_registration_error::SystemRegistrationError;
use crate::ecs::system_registry::{RegisteredSystem, SystemRegistry};

/// World construction parameters: the §6 configuration surface. Hosts can
/// describe a world in JSON and deserialize straight into this.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Caps the live entity count and sizes every per-entity array.
    pub max_entities: usize,
    /// Ordered component descriptors; position assigns the component index.
    pub components: Vec<ComponentDescriptor>,
}

/// Structural counters, mostly useful in tests and tick telemetry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub spawned: u64,
    pub despawned: u64,
    /// Full query recomputations. A signature queried on an unchanged world
    /// does not move this.
    pub query_refreshes: u64,
}

/// The ECS world.
///
/// Component count is not capped: archetype bitmasks grow by whole 32-bit
/// words (`ceil(components / 32)`), with the single-word case kept hot.
pub struct World {
    capacity: usize,
    stores: Vec<ColumnStore>,
    comp_index: HashMap<String, usize>,
    allocator: EntityAllocator,
    masks: ArchetypeMasks,
    cache: QueryCache,
    systems: SystemRegistry,
    spawned: u64,
    despawned: u64,
}

impl World {
    /// Build a world from a capacity and an ordered list of component
    /// descriptors. Validates that component names and per-component field
    /// names are unique.
    pub fn new(
        max_entities: usize,
        components: Vec<ComponentDescriptor>,
    ) -> Result<Self, EcsError> {
        if max_entities == 0 {
            return Err(EcsError::ZeroCapacity);
        }
        let mut comp_index = HashMap::new();
        for (k, desc) in components.iter().enumerate() {
            if comp_index.insert(desc.name().to_string(), k).is_some() {
                return Err(EcsError::DuplicateComponent {
                    name: desc.name().to_string(),
                });
            }
            let mut seen = HashSet::new();
            for field in desc.fields() {
                if !seen.insert(field.name.as_str()) {
                    return Err(EcsError::DuplicateField {
                        component: desc.name().to_string(),
                        field: field.name.clone(),
                    });
                }
            }
        }
        let stores: Vec<ColumnStore> = components
            .iter()
            .map(|desc| ColumnStore::new(desc, max_entities))
            .collect();
        let masks = ArchetypeMasks::new(max_entities, components.len());
        tracing::debug!(
            components = components.len(),
            max_entities,
            mask_words = masks.words(),
            "world constructed"
        );
        Ok(Self {
            capacity: max_entities,
            stores,
            comp_index,
            allocator: EntityAllocator::new(max_entities),
            masks,
            cache: QueryCache::new(),
            systems: SystemRegistry::new(),
            spawned: 0,
            despawned: 0,
        })
    }

    pub fn from_config(config: WorldConfig) -> Result<Self, EcsError> {
        Self::new(config.max_entities, config.components)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn component_count(&self) -> usize {
        self.stores.len()
    }

    /// Current archetype version; bumps on every structural change.
    pub fn archetype_version(&self) -> u64 {
        self.masks.version()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            spawned: self.spawned,
            despawned: self.despawned,
            query_refreshes: self.cache.refresh_count(),
        }
    }

    // ------------------------------------------------------------------
    // Entity lifecycle
    // ------------------------------------------------------------------

    /// Allocate an entity id. Freed ids are reused (FIFO) before the
    /// high-water mark advances.
    pub fn spawn(&mut self) -> Result<EntityId, EcsError> {
        let id = match self.allocator.spawn() {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(capacity = self.capacity, "spawn rejected, world is full");
                return Err(err);
            }
        };
        self.masks.clear_all(id);
        self.masks.bump();
        self.spawned += 1;
        Ok(id)
    }

    /// Despawn an entity: clears every attached component record and frees
    /// the id. Despawning a dead id is a silent no-op (returns false).
    pub fn despawn(&mut self, e: EntityId) -> bool {
        if !self.allocator.despawn(e) {
            return false;
        }
        // Clear only the columns whose bits are set.
        for w in 0..self.masks.words() {
            let mut word = self.masks.word(e, w);
            while word != 0 {
                let k = (w << 5) + word.trailing_zeros() as usize;
                self.stores[k].clear(e);
                word &= word - 1;
            }
        }
        self.masks.clear_all(e);
        self.masks.bump();
        self.despawned += 1;
        true
    }

    #[inline]
    pub fn alive(&self, e: EntityId) -> bool {
        self.allocator.is_alive(e)
    }

    /// The dense live-id list. Order changes on despawn (swap-remove).
    pub fn live_entities(&self) -> &[EntityId] {
        self.allocator.live()
    }

    pub fn live_count(&self) -> usize {
        self.allocator.live_count()
    }

    // ------------------------------------------------------------------
    // Component data
    // ------------------------------------------------------------------

    /// Does `e` currently carry `component`? False for dead ids and
    /// unregistered components.
    pub fn has(&self, e: EntityId, component: &str) -> bool {
        match self.comp_index.get(component) {
            Some(&k) => (e as usize) < self.capacity && self.masks.has(e, k),
            None => false,
        }
    }

    /// Attach a component to a live entity. The record starts from zero and
    /// the provided fields are applied on top, so omitted fields default.
    /// Re-adding a component an entity already has resets its record
    /// without a version bump.
    pub fn add(
        &mut self,
        e: EntityId,
        component: &str,
        fields: &[(&str, Value)],
    ) -> Result<(), EcsError> {
        if !self.allocator.is_alive(e) {
            return Err(EcsError::DeadEntity { entity: e });
        }
        let k = self.comp_idx(component)?;
        self.stores[k].validate_fields(fields)?;
        self.stores[k].clear(e);
        self.stores[k]
            .write_fields(e, fields)
            .expect("fields validated");
        if !self.masks.has(e, k) {
            self.masks.set(e, k);
            self.masks.bump();
        }
        Ok(())
    }

    /// Overwrite the whole record: zero it, then apply the provided fields.
    /// Requires the component to be present.
    pub fn set(
        &mut self,
        e: EntityId,
        component: &str,
        fields: &[(&str, Value)],
    ) -> Result<(), EcsError> {
        let k = self.require(e, component)?;
        self.stores[k].validate_fields(fields)?;
        self.stores[k].clear(e);
        self.stores[k]
            .write_fields(e, fields)
            .expect("fields validated");
        Ok(())
    }

    /// Partial write: only the mentioned fields change.
    pub fn update(
        &mut self,
        e: EntityId,
        component: &str,
        fields: &[(&str, Value)],
    ) -> Result<(), EcsError> {
        let k = self.require(e, component)?;
        self.stores[k].validate_fields(fields)?;
        self.stores[k]
            .write_fields(e, fields)
            .expect("fields validated");
        Ok(())
    }

    /// Detach a component: zero its record, clear the bit, bump the
    /// version.
    pub fn remove(&mut self, e: EntityId, component: &str) -> Result<(), EcsError> {
        let k = self.require(e, component)?;
        self.stores[k].clear(e);
        self.masks.clear(e, k);
        self.masks.bump();
        Ok(())
    }

    /// Read the record into the store-owned scratch and borrow it.
    ///
    /// The reference is valid until the next read on the same component's
    /// store; copy values out to retain them.
    pub fn get(&mut self, e: EntityId, component: &str) -> Result<&Record, EcsError> {
        let k = self.require(e, component)?;
        Ok(self.stores[k].read(e))
    }

    /// Read a fresh copy of the record. Allocates; fine off the hot path.
    pub fn get_copy(&self, e: EntityId, component: &str) -> Result<Record, EcsError> {
        let k = self.require(e, component)?;
        Ok(self.stores[k].read_copy(e))
    }

    /// Read-modify-write: load the record, hand it to `f` mutably, write it
    /// back. The dynamic equivalent of a mutable component borrow; tight
    /// loops use [`column`](Self::column) instead.
    pub fn modify<F>(&mut self, e: EntityId, component: &str, f: F) -> Result<(), EcsError>
    where
        F: FnOnce(&mut Record),
    {
        let k = self.require(e, component)?;
        let store = &mut self.stores[k];
        let mut record = store.read_copy(e);
        f(&mut record);
        store.write(e, &record);
        Ok(())
    }

    /// Stable raw reference to one field's column array. The foundation of
    /// the direct-access path: resolve once, index by entity id forever.
    pub fn column(&mut self, component: &str, field: &str) -> Result<FieldRef, EcsError> {
        let k = self.comp_idx(component)?;
        self.stores[k].field(field)
    }

    /// Borrow a component's column store directly.
    pub fn store(&self, component: &str) -> Result<&ColumnStore, EcsError> {
        let k = self.comp_idx(component)?;
        Ok(&self.stores[k])
    }

    pub fn store_mut(&mut self, component: &str) -> Result<&mut ColumnStore, EcsError> {
        let k = self.comp_idx(component)?;
        Ok(&mut self.stores[k])
    }

    /// Fluent handle bound to one entity id.
    pub fn entity(&mut self, id: EntityId) -> EntityHandle<'_> {
        EntityHandle::new(self, id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Live entities carrying every component in `signature`.
    ///
    /// The returned slice borrows the persistent cache buffer: it is valid
    /// until the next structural change or the next query of the same
    /// signature after one. On an unchanged world this is a stamp check and
    /// a borrow, no iteration.
    ///
    /// An empty signature or one naming an unregistered component yields an
    /// empty slice and leaves the cache untouched.
    pub fn query(&mut self, signature: &[&str]) -> &[EntityId] {
        const EMPTY: &[EntityId] = &[];
        if signature.is_empty() {
            return EMPTY;
        }
        let mut indices = Vec::with_capacity(signature.len());
        for name in signature {
            match self.comp_index.get(*name) {
                Some(&k) => indices.push(k),
                None => return EMPTY,
            }
        }
        indices.sort_unstable();
        indices.dedup();
        let mask = required_mask(&indices, self.masks.words());
        let key = canonical_key(&mask);
        self.cache
            .refresh(&key, &mask, self.allocator.live(), &self.masks)
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Register a system: resolve its signature and column bindings, prime
    /// the query cache for its signature, and append it to the execution
    /// order.
    ///
    /// Registration from inside a running tick is unsupported.
    pub fn register_system<F>(
        &mut self,
        descriptor: SystemDescriptor,
        callback: F,
    ) -> Result<SystemHandle, SystemRegistrationError>
    where
        F: FnMut(&mut EntityProxy, f32, &mut World) + 'static,
    {
        let name = descriptor.name().to_string();
        if descriptor.signature().is_empty() {
            return Err(SystemRegistrationError::EmptySignature { name });
        }
        if self.systems.contains(&name) {
            return Err(SystemRegistrationError::DuplicateName { name });
        }

        let mut indices = Vec::with_capacity(descriptor.signature().len());
        for component in descriptor.signature() {
            match self.comp_index.get(component.as_str()) {
                Some(&k) => indices.push(k),
                None => {
                    return Err(SystemRegistrationError::UnknownComponent {
                        system: name,
                        component: component.clone(),
                        registered: self.registered_names(),
                    });
                }
            }
        }

        // Resolve every bound column once; the proxy carries the flat table
        // for the lifetime of the system.
        let mut columns: Vec<FieldRef> = Vec::new();
        let mut index = HashMap::new();
        let mut aliases = HashSet::new();
        for binding in descriptor.bindings() {
            if !aliases.insert(binding.alias.clone()) {
                return Err(SystemRegistrationError::DuplicateAlias {
                    system: name,
                    alias: binding.alias.clone(),
                });
            }
            let k = *self
                .comp_index
                .get(binding.component.as_str())
                .expect("binding component resolved with the signature");
            for field in &binding.fields {
                let fidx = self.stores[k].field_index(field).ok_or_else(|| {
                    SystemRegistrationError::UnknownField {
                        system: name.clone(),
                        component: binding.component.clone(),
                        field: field.clone(),
                    }
                })?;
                index.insert(
                    format!("{}.{}", binding.alias, field),
                    columns.len(),
                );
                columns.push(self.stores[k].field_ref_at(fidx));
            }
        }

        indices.sort_unstable();
        indices.dedup();
        let mask = required_mask(&indices, self.masks.words());
        let key = canonical_key(&mask);
        // Prime the cache so the first tick starts on the stamp-check path.
        self.cache
            .refresh(&key, &mask, self.allocator.live(), &self.masks);

        tracing::debug!(
            system = %name,
            signature = ?descriptor.signature(),
            columns = columns.len(),
            "system registered"
        );
        let proxy = EntityProxy::new(columns.into_boxed_slice(), index);
        Ok(self.systems.register(RegisteredSystem {
            name,
            key,
            mask,
            proxy,
            callback: Box::new(callback),
        }))
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Execute every registered system once, in registration order.
    ///
    /// For each system the cached entity list is brought up to date and
    /// then iterated as a borrowed snapshot: structural changes made by a
    /// callback (spawn, despawn, add, remove) are visible to *later*
    /// systems in the same tick, but do not alter the list the current
    /// system is walking. A callback that despawns an entity ahead of the
    /// cursor will still see that id come through; guard with
    /// [`alive`](Self::alive) where it matters.
    pub fn run_systems(&mut self, dt: f32) {
        let mut systems = self.systems.detach();
        for sys in systems.iter_mut() {
            self.cache
                .refresh(&sys.key, &sys.mask, self.allocator.live(), &self.masks);
            let (ids, stamp) = self.cache.detach(&sys.key);
            for &e in &ids {
                sys.proxy.eid = e;
                (sys.callback)(&mut sys.proxy, dt, self);
            }
            self.cache.reattach(&sys.key, ids, stamp);
        }
        self.systems.reattach(systems);
    }

    // ------------------------------------------------------------------
    // Snapshot surface
    // ------------------------------------------------------------------

    /// Columns and parallel entity ids for every live carrier of
    /// `component`. Encoding belongs to the serialization collaborator.
    pub fn snapshot(&self, component: &str) -> Result<ComponentSnapshot<'_>, EcsError> {
        let k = self.comp_idx(component)?;
        let entities: Vec<EntityId> = self
            .allocator
            .live()
            .iter()
            .copied()
            .filter(|&e| self.masks.has(e, k))
            .collect();
        Ok(self.snapshot_columns(k, entities))
    }

    /// Same as [`snapshot`](Self::snapshot) restricted to a caller-chosen
    /// id subset; dead ids and non-carriers are dropped.
    pub fn snapshot_for(
        &self,
        component: &str,
        ids: &[EntityId],
    ) -> Result<ComponentSnapshot<'_>, EcsError> {
        let k = self.comp_idx(component)?;
        let entities: Vec<EntityId> = ids
            .iter()
            .copied()
            .filter(|&e| self.allocator.is_alive(e) && self.masks.has(e, k))
            .collect();
        Ok(self.snapshot_columns(k, entities))
    }

    /// Decode a snapshot payload back into columns. Deliberately
    /// unimplemented until the serialization collaborator settles its wire
    /// format.
    pub fn apply_snapshot(&mut self, _component: &str, _payload: &[u8]) -> Result<(), EcsError> {
        Err(EcsError::SnapshotDecodeUnimplemented)
    }

    fn snapshot_columns(&self, k: usize, entities: Vec<EntityId>) -> ComponentSnapshot<'_> {
        let store = &self.stores[k];
        let layout = store.layout();
        let fields = (0..store.field_count())
            .map(|i| FieldColumn {
                name: layout.names[i].as_str(),
                kind: layout.kinds[i],
                values: store.field_array(i),
            })
            .collect();
        ComponentSnapshot {
            component: store.component(),
            entities,
            fields,
        }
    }

    // ------------------------------------------------------------------
    // Resolution helpers
    // ------------------------------------------------------------------

    fn comp_idx(&self, name: &str) -> Result<usize, EcsError> {
        self.comp_index
            .get(name)
            .copied()
            .ok_or_else(|| EcsError::UnknownComponent {
                name: name.to_string(),
                registered: self.registered_names(),
            })
    }

    /// Component index if `e` carries it, MissingComponent otherwise.
    fn require(&self, e: EntityId, component: &str) -> Result<usize, EcsError> {
        let k = self.comp_idx(component)?;
        if (e as usize) < self.capacity && self.masks.has(e, k) {
            Ok(k)
        } else {
            Err(EcsError::MissingComponent {
                entity: e,
                component: component.to_string(),
                present: self.present_names(e),
            })
        }
    }

    fn registered_names(&self) -> String {
        self.stores
            .iter()
            .map(|s| s.component())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn present_names(&self, e: EntityId) -> String {
        if (e as usize) >= self.capacity {
            return String::new();
        }
        self.stores
            .iter()
            .enumerate()
            .filter(|(k, _)| self.masks.has(e, *k))
            .map(|(_, s)| s.component())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::FieldKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn transform() -> ComponentDescriptor {
        ComponentDescriptor::new("Transform")
            .field("x", FieldKind::F32)
            .field("y", FieldKind::F32)
            .field("rot", FieldKind::F32)
    }

    fn velocity() -> ComponentDescriptor {
        ComponentDescriptor::new("Velocity")
            .field("dx", FieldKind::F32)
            .field("dy", FieldKind::F32)
    }

    fn tag(name: &str) -> ComponentDescriptor {
        ComponentDescriptor::new(name).field("v", FieldKind::U8)
    }

    #[test]
    fn test_spawn_despawn_id_reuse() {
        let mut world = World::new(4, vec![tag("T")]).unwrap();
        assert_eq!(world.spawn().unwrap(), 0);
        assert_eq!(world.spawn().unwrap(), 1);
        assert!(world.despawn(0));
        assert_eq!(world.spawn().unwrap(), 0);
        assert_eq!(world.spawn().unwrap(), 2);

        let mut live: Vec<EntityId> = world.live_entities().to_vec();
        live.sort_unstable();
        assert_eq!(live, vec![0, 1, 2]);
    }

    #[test]
    fn test_partial_update() {
        let mut world = World::new(8, vec![transform()]).unwrap();
        let e = world.spawn().unwrap();
        world
            .add(
                e,
                "Transform",
                &[
                    ("x", Value::F32(100.0)),
                    ("y", Value::F32(200.0)),
                    ("rot", Value::F32(0.0)),
                ],
            )
            .unwrap();
        world.update(e, "Transform", &[("x", Value::F32(150.0))]).unwrap();

        let rec = world.get(e, "Transform").unwrap();
        assert_eq!(rec.get("x"), Some(Value::F32(150.0)));
        assert_eq!(rec.get("y"), Some(Value::F32(200.0)));
        assert_eq!(rec.get("rot"), Some(Value::F32(0.0)));
    }

    #[test]
    fn test_query_cache_persists_across_data_writes() {
        let mut world = World::new(1024, vec![tag("T"), tag("V")]).unwrap();
        for _ in 0..1000 {
            let e = world.spawn().unwrap();
            world.add(e, "T", &[("v", Value::U8(1))]).unwrap();
            world.add(e, "V", &[("v", Value::U8(2))]).unwrap();
        }

        let first: Vec<EntityId> = world.query(&["T", "V"]).to_vec();
        assert_eq!(first.len(), 1000);

        let refreshes = world.stats().query_refreshes;
        let ptr = world.query(&["T", "V"]).as_ptr();

        // Data-only writes do not bump the archetype version.
        for e in 0..1000 {
            world.update(e, "T", &[("v", Value::U8(9))]).unwrap();
        }

        let again: Vec<EntityId> = world.query(&["T", "V"]).to_vec();
        let again_ptr = world.query(&["T", "V"]).as_ptr();
        assert_eq!(again.len(), 1000);
        assert_eq!(again_ptr, ptr);
        assert_eq!(again, first);
        assert_eq!(world.stats().query_refreshes, refreshes);
    }

    #[test]
    fn test_despawn_invalidates_query_cache() {
        let mut world = World::new(1024, vec![tag("T"), tag("V")]).unwrap();
        for _ in 0..1000 {
            let e = world.spawn().unwrap();
            world.add(e, "T", &[]).unwrap();
            world.add(e, "V", &[]).unwrap();
        }
        assert_eq!(world.query(&["T", "V"]).len(), 1000);

        let victims: Vec<EntityId> = (100..110).collect();
        for &e in &victims {
            world.despawn(e);
        }
        let matched = world.query(&["T", "V"]);
        assert_eq!(matched.len(), 990);
        for e in victims {
            assert!(!matched.contains(&e));
        }
    }

    #[test]
    fn test_query_permutations_share_one_cache_entry() {
        let mut world = World::new(8, vec![tag("T"), tag("V")]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "T", &[]).unwrap();
        world.add(e, "V", &[]).unwrap();

        assert_eq!(world.query(&["T", "V"]).len(), 1);
        let refreshes = world.stats().query_refreshes;
        // Reversed signature hits the same canonical key.
        assert_eq!(world.query(&["V", "T"]).len(), 1);
        assert_eq!(world.stats().query_refreshes, refreshes);
    }

    #[test]
    fn test_query_unknown_or_empty_signature_is_empty() {
        let mut world = World::new(8, vec![tag("T")]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "T", &[]).unwrap();

        let refreshes = world.stats().query_refreshes;
        assert!(world.query(&["Missing"]).is_empty());
        assert!(world.query(&["T", "Missing"]).is_empty());
        assert!(world.query(&[]).is_empty());
        // No cache mutation happened.
        assert_eq!(world.stats().query_refreshes, refreshes);
    }

    #[test]
    fn test_signature_with_every_component() {
        let mut world = World::new(8, vec![tag("A"), tag("B"), tag("C")]).unwrap();
        let all = world.spawn().unwrap();
        let some = world.spawn().unwrap();
        for comp in ["A", "B", "C"] {
            world.add(all, comp, &[]).unwrap();
        }
        world.add(some, "A", &[]).unwrap();
        world.add(some, "B", &[]).unwrap();

        assert_eq!(world.query(&["A", "B", "C"]), &[all]);
        let mut both: Vec<EntityId> = world.query(&["A", "B"]).to_vec();
        both.sort_unstable();
        assert_eq!(both, vec![all, some]);
    }

    #[test]
    fn test_single_entity_world() {
        let mut world = World::new(1, vec![tag("T")]).unwrap();
        let e = world.spawn().unwrap();
        assert_eq!(e, 0);
        assert!(matches!(
            world.spawn(),
            Err(EcsError::CapacityExceeded { capacity: 1 })
        ));
        world.add(e, "T", &[]).unwrap();
        assert_eq!(world.query(&["T"]), &[0]);

        world.despawn(e);
        assert!(world.query(&["T"]).is_empty());
        assert_eq!(world.spawn().unwrap(), 0);
        // The reused slot starts with a clean archetype.
        assert!(!world.has(0, "T"));
    }

    #[test]
    fn test_zero_component_world() {
        let mut world = World::new(4, vec![]).unwrap();
        let e = world.spawn().unwrap();
        assert!(world.alive(e));
        assert!(world.query(&["Anything"]).is_empty());
        assert!(!world.has(e, "Anything"));
        world.despawn(e);
        assert_eq!(world.live_count(), 0);
    }

    #[test]
    fn test_despawn_clears_records_for_reuse() {
        let mut world = World::new(4, vec![transform()]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "Transform", &[("x", Value::F32(7.0))]).unwrap();
        world.despawn(e);

        let e2 = world.spawn().unwrap();
        assert_eq!(e2, e);
        world.add(e2, "Transform", &[]).unwrap();
        let rec = world.get(e2, "Transform").unwrap();
        assert_eq!(rec.get("x"), Some(Value::F32(0.0)));
    }

    #[test]
    fn test_double_despawn_is_silent() {
        let mut world = World::new(4, vec![tag("T")]).unwrap();
        let e = world.spawn().unwrap();
        assert!(world.despawn(e));
        let version = world.archetype_version();
        assert!(!world.despawn(e));
        assert_eq!(world.archetype_version(), version);
    }

    #[test]
    fn test_add_on_dead_entity_fails() {
        let mut world = World::new(4, vec![tag("T")]).unwrap();
        let e = world.spawn().unwrap();
        world.despawn(e);
        assert!(matches!(
            world.add(e, "T", &[]),
            Err(EcsError::DeadEntity { entity }) if entity == e
        ));
    }

    #[test]
    fn test_unknown_component_error_lists_registered() {
        let mut world = World::new(4, vec![tag("T"), tag("V")]).unwrap();
        let e = world.spawn().unwrap();
        let err = world.add(e, "Nope", &[]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Nope"));
        assert!(msg.contains("T"));
        assert!(msg.contains("V"));
    }

    #[test]
    fn test_missing_component_error_lists_present() {
        let mut world = World::new(4, vec![tag("T"), tag("V")]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "T", &[]).unwrap();
        let err = world.get(e, "V").unwrap_err();
        match &err {
            EcsError::MissingComponent { present, .. } => assert_eq!(present, "T"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_re_add_resets_record_without_version_bump() {
        let mut world = World::new(4, vec![tag("T")]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "T", &[("v", Value::U8(5))]).unwrap();
        let version = world.archetype_version();
        world.add(e, "T", &[]).unwrap();
        assert_eq!(world.archetype_version(), version);
        assert_eq!(world.get(e, "T").unwrap().get("v"), Some(Value::U8(0)));
    }

    #[test]
    fn test_remove_detaches_and_invalidates() {
        let mut world = World::new(4, vec![tag("T"), tag("V")]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "T", &[("v", Value::U8(3))]).unwrap();
        world.add(e, "V", &[]).unwrap();
        assert_eq!(world.query(&["T", "V"]), &[e]);

        world.remove(e, "T").unwrap();
        assert!(!world.has(e, "T"));
        assert!(world.query(&["T", "V"]).is_empty());
        assert!(matches!(
            world.get(e, "T"),
            Err(EcsError::MissingComponent { .. })
        ));
        // Removing again is a missing-component error, not a panic.
        assert!(world.remove(e, "T").is_err());
    }

    #[test]
    fn test_modify_round_trips_the_record() {
        let mut world = World::new(4, vec![transform()]).unwrap();
        let e = world.spawn().unwrap();
        world
            .add(e, "Transform", &[("x", Value::F32(10.0)), ("y", Value::F32(3.0))])
            .unwrap();

        world
            .modify(e, "Transform", |rec| {
                let x = rec.get("x").and_then(Value::as_f32).unwrap_or(0.0);
                rec.set("x", Value::F32(x * 2.0)).unwrap();
            })
            .unwrap();

        let rec = world.get(e, "Transform").unwrap();
        assert_eq!(rec.get("x"), Some(Value::F32(20.0)));
        assert_eq!(rec.get("y"), Some(Value::F32(3.0)));
    }

    #[test]
    fn test_column_independence() {
        let mut world = World::new(4, vec![transform(), velocity()]).unwrap();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        world.add(a, "Transform", &[("x", Value::F32(1.0))]).unwrap();
        world.add(a, "Velocity", &[("dx", Value::F32(2.0))]).unwrap();
        world.add(b, "Transform", &[("x", Value::F32(3.0))]).unwrap();

        world.set(a, "Transform", &[("x", Value::F32(99.0))]).unwrap();
        // Velocity on a and Transform on b are untouched.
        assert_eq!(
            world.get(a, "Velocity").unwrap().get("dx"),
            Some(Value::F32(2.0))
        );
        assert_eq!(
            world.get(b, "Transform").unwrap().get("x"),
            Some(Value::F32(3.0))
        );
    }

    #[test]
    fn test_world_validation_errors() {
        assert!(matches!(
            World::new(0, vec![]),
            Err(EcsError::ZeroCapacity)
        ));
        assert!(matches!(
            World::new(4, vec![tag("T"), tag("T")]),
            Err(EcsError::DuplicateComponent { .. })
        ));
        let bad = ComponentDescriptor::new("P")
            .field("x", FieldKind::F32)
            .field("x", FieldKind::F32);
        assert!(matches!(
            World::new(4, vec![bad]),
            Err(EcsError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_movement_system_with_raw_columns() {
        let mut world = World::new(16, vec![transform(), velocity()]).unwrap();
        for i in 0..4 {
            let e = world.spawn().unwrap();
            world
                .add(e, "Transform", &[("x", Value::F32(i as f32))])
                .unwrap();
            world
                .add(e, "Velocity", &[("dx", Value::F32(10.0))])
                .unwrap();
        }

        // Raw path: resolve once, index by entity id inside the callback.
        let xs = world.column("Transform", "x").unwrap();
        let dxs = world.column("Velocity", "dx").unwrap();
        world
            .register_system(
                SystemDescriptor::new("movement")
                    .requires("Transform")
                    .requires("Velocity"),
                move |proxy, dt, _world| {
                    let e = proxy.eid;
                    xs.set_f32(e, xs.f32(e) + dxs.f32(e) * dt);
                },
            )
            .unwrap();

        world.run_systems(0.5);
        let xs = world.column("Transform", "x").unwrap();
        for e in 0..4 {
            assert_eq!(xs.f32(e), e as f32 + 5.0);
        }
    }

    #[test]
    fn test_earlier_system_effects_visible_to_later() {
        let mut world = World::new(4, vec![velocity()]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "Velocity", &[]).unwrap();

        world
            .register_system(
                SystemDescriptor::new("produce").binds("vel", "Velocity", &["dx"]),
                |proxy, _dt, _world| proxy.set_f32("vel.dx", 5.0),
            )
            .unwrap();
        world
            .register_system(
                SystemDescriptor::new("consume").binds("vel", "Velocity", &["dx", "dy"]),
                |proxy, _dt, _world| {
                    let dx = proxy.f32("vel.dx");
                    proxy.set_f32("vel.dy", dx * 2.0);
                },
            )
            .unwrap();

        world.run_systems(1.0);
        let rec = world.get(e, "Velocity").unwrap();
        assert_eq!(rec.get("dx"), Some(Value::F32(5.0)));
        assert_eq!(rec.get("dy"), Some(Value::F32(10.0)));
    }

    #[test]
    fn test_in_tick_despawn_keeps_current_snapshot() {
        let mut world = World::new(8, vec![tag("T")]).unwrap();
        for _ in 0..3 {
            let e = world.spawn().unwrap();
            world.add(e, "T", &[]).unwrap();
        }

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_cb = seen.clone();
        world
            .register_system(
                SystemDescriptor::new("reaper").requires("T"),
                move |proxy, _dt, world| {
                    seen_in_cb.borrow_mut().push(proxy.eid);
                    if proxy.eid == 0 {
                        // Despawn an entity that is still ahead in this
                        // tick's snapshot.
                        world.despawn(1);
                    }
                },
            )
            .unwrap();

        world.run_systems(1.0);
        // The borrowed snapshot still delivered id 1.
        assert_eq!(&*seen.borrow(), &[0, 1, 2]);

        seen.borrow_mut().clear();
        world.run_systems(1.0);
        let mut second: Vec<EntityId> = seen.borrow().clone();
        second.sort_unstable();
        assert_eq!(second, vec![0, 2]);
    }

    #[test]
    fn test_combat_cross_entity_read() {
        let components = vec![
            ComponentDescriptor::new("Cooldown")
                .field("current", FieldKind::F32)
                .field("max", FieldKind::F32),
            ComponentDescriptor::new("Damage").field("amount", FieldKind::U16),
            ComponentDescriptor::new("Target").field("eid", FieldKind::U32),
            ComponentDescriptor::new("Health")
                .field("current", FieldKind::U16)
                .field("max", FieldKind::U16),
            ComponentDescriptor::new("Armor").field("value", FieldKind::U16),
        ];
        let mut world = World::new(16, components).unwrap();

        let attacker = world.spawn().unwrap();
        let victim = world.spawn().unwrap();
        world
            .add(
                attacker,
                "Cooldown",
                &[("current", Value::F32(0.0)), ("max", Value::F32(1.0))],
            )
            .unwrap();
        world
            .add(attacker, "Damage", &[("amount", Value::U16(20))])
            .unwrap();
        world
            .add(attacker, "Target", &[("eid", Value::U32(victim))])
            .unwrap();
        world
            .add(
                victim,
                "Health",
                &[("current", Value::U16(100)), ("max", Value::U16(100))],
            )
            .unwrap();
        world
            .add(victim, "Armor", &[("value", Value::U16(50))])
            .unwrap();

        world
            .register_system(
                SystemDescriptor::new("cooldown").binds("cool", "Cooldown", &["current"]),
                |proxy, dt, _world| {
                    let c = proxy.f32("cool.current");
                    proxy.set_f32("cool.current", (c - dt).max(0.0));
                },
            )
            .unwrap();

        // Cross-entity reads go through columns resolved up front plus the
        // world's alive/has checks.
        let health = world.column("Health", "current").unwrap();
        let armor = world.column("Armor", "value").unwrap();
        world
            .register_system(
                SystemDescriptor::new("attack")
                    .binds("cool", "Cooldown", &["current", "max"])
                    .binds("dmg", "Damage", &["amount"])
                    .binds("tgt", "Target", &["eid"]),
                move |proxy, _dt, world| {
                    if proxy.f32("cool.current") > 0.0 {
                        return;
                    }
                    let target = proxy.u32("tgt.eid");
                    if !world.alive(target) || !world.has(target, "Health") {
                        return;
                    }
                    let mitigation = if world.has(target, "Armor") {
                        armor.u16(target) as f32 * 0.1
                    } else {
                        0.0
                    };
                    let dealt = (proxy.u16("dmg.amount") as f32 - mitigation)
                        .floor()
                        .max(1.0) as u16;
                    health.set_u16(target, health.u16(target).saturating_sub(dealt));
                    proxy.set_f32("cool.current", proxy.f32("cool.max"));
                },
            )
            .unwrap();

        // First tick: cooldown is 0, attack fires for 20 - 50*0.1 = 15.
        world.run_systems(1.0 / 60.0);
        assert_eq!(
            world.get(victim, "Health").unwrap().get("current"),
            Some(Value::U16(85))
        );
        assert_eq!(
            world.get(attacker, "Cooldown").unwrap().get("current"),
            Some(Value::F32(1.0))
        );

        // Later tick with dt = 0.5: cooldown decays to 0.5, no damage.
        world.run_systems(0.5);
        assert_eq!(
            world.get(victim, "Health").unwrap().get("current"),
            Some(Value::U16(85))
        );
        assert_eq!(
            world.get(attacker, "Cooldown").unwrap().get("current"),
            Some(Value::F32(0.5))
        );
    }

    #[test]
    fn test_boundary_wrap_system() {
        let mut world = World::new(8, vec![transform()]).unwrap();
        let e = world.spawn().unwrap();
        world
            .add(
                e,
                "Transform",
                &[("x", Value::F32(-1.0)), ("y", Value::F32(1001.0))],
            )
            .unwrap();

        world
            .register_system(
                SystemDescriptor::new("boundary").binds("pos", "Transform", &["x", "y"]),
                |proxy, _dt, _world| {
                    for axis in ["pos.x", "pos.y"] {
                        let v = proxy.f32(axis);
                        if v < 0.0 {
                            proxy.set_f32(axis, 1000.0);
                        } else if v > 1000.0 {
                            proxy.set_f32(axis, 0.0);
                        }
                    }
                },
            )
            .unwrap();

        world.run_systems(1.0 / 60.0);
        let rec = world.get(e, "Transform").unwrap();
        assert_eq!(rec.get("x"), Some(Value::F32(1000.0)));
        assert_eq!(rec.get("y"), Some(Value::F32(0.0)));
    }

    #[test]
    fn test_registration_errors() {
        let mut world = World::new(4, vec![transform()]).unwrap();
        let noop = |_: &mut EntityProxy, _: f32, _: &mut World| {};

        assert!(matches!(
            world.register_system(SystemDescriptor::new("empty"), noop),
            Err(SystemRegistrationError::EmptySignature { .. })
        ));
        assert!(matches!(
            world.register_system(SystemDescriptor::new("s").requires("Ghost"), noop),
            Err(SystemRegistrationError::UnknownComponent { .. })
        ));
        assert!(matches!(
            world.register_system(
                SystemDescriptor::new("s").binds("pos", "Transform", &["warp"]),
                noop
            ),
            Err(SystemRegistrationError::UnknownField { .. })
        ));
        assert!(matches!(
            world.register_system(
                SystemDescriptor::new("s")
                    .binds("pos", "Transform", &["x"])
                    .binds("pos", "Transform", &["y"]),
                noop
            ),
            Err(SystemRegistrationError::DuplicateAlias { .. })
        ));

        world
            .register_system(
                SystemDescriptor::new("ok").requires("Transform"),
                noop,
            )
            .unwrap();
        assert!(matches!(
            world.register_system(SystemDescriptor::new("ok").requires("Transform"), noop),
            Err(SystemRegistrationError::DuplicateName { .. })
        ));
        assert_eq!(world.system_count(), 1);
    }

    #[test]
    fn test_registration_primes_query_cache() {
        let mut world = World::new(8, vec![tag("T")]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "T", &[]).unwrap();

        world
            .register_system(
                SystemDescriptor::new("s").requires("T"),
                |_proxy, _dt, _world| {},
            )
            .unwrap();
        // Registration already walked the live list for this signature.
        let refreshes = world.stats().query_refreshes;
        assert_eq!(world.query(&["T"]), &[e]);
        assert_eq!(world.stats().query_refreshes, refreshes);
    }

    #[test]
    fn test_fluent_entity_handle() {
        let mut world = World::new(8, vec![transform(), velocity()]).unwrap();
        let e = world.spawn().unwrap();
        world
            .entity(e)
            .add("Transform", &[("x", Value::F32(10.0))])
            .unwrap()
            .add("Velocity", &[("dx", Value::F32(1.0))])
            .unwrap()
            .update("Transform", &[("y", Value::F32(4.0))])
            .unwrap();

        assert!(world.entity(e).has("Transform"));
        let rec = world.entity(e).get_copy("Transform").unwrap();
        assert_eq!(rec.get("x"), Some(Value::F32(10.0)));
        assert_eq!(rec.get("y"), Some(Value::F32(4.0)));

        assert!(world.entity(e).despawn());
        assert!(!world.alive(e));
    }

    #[test]
    fn test_snapshot_surface() {
        let mut world = World::new(8, vec![transform(), velocity()]).unwrap();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        let c = world.spawn().unwrap();
        world.add(a, "Transform", &[("x", Value::F32(1.0))]).unwrap();
        world.add(b, "Transform", &[("x", Value::F32(2.0))]).unwrap();
        world.add(c, "Velocity", &[]).unwrap();

        let snap = world.snapshot("Transform").unwrap();
        assert_eq!(snap.component, "Transform");
        assert_eq!(snap.entities, vec![a, b]);
        assert_eq!(snap.fields.len(), 3);
        assert_eq!(snap.fields[0].name, "x");

        let xs = snap.fields[0].values.as_f32().unwrap();
        assert_eq!(xs[a as usize], 1.0);
        assert_eq!(xs[b as usize], 2.0);

        let subset = world.snapshot_for("Transform", &[b, c, 99]).unwrap();
        assert_eq!(subset.entities, vec![b]);

        assert!(matches!(
            world.apply_snapshot("Transform", &[]),
            Err(EcsError::SnapshotDecodeUnimplemented)
        ));
    }

    #[test]
    fn test_proxy_slot_path_avoids_lookups() {
        let mut world = World::new(4, vec![transform()]).unwrap();
        let e = world.spawn().unwrap();
        world.add(e, "Transform", &[("x", Value::F32(3.0))]).unwrap();

        world
            .register_system(
                SystemDescriptor::new("slots").binds("pos", "Transform", &["x"]),
                |proxy, _dt, _world| {
                    let slot = proxy.resolve("pos.x").unwrap();
                    let v = proxy.get_at(slot);
                    proxy.set_at(slot, Value::F32(v.as_f32().unwrap() * 2.0));
                },
            )
            .unwrap();
        world.run_systems(1.0);
        assert_eq!(
            world.get(e, "Transform").unwrap().get("x"),
            Some(Value::F32(6.0))
        );
    }

    #[test]
    fn test_world_from_json_config() {
        let json = r#"{
            "max_entities": 32,
            "components": [
                {
                    "name": "Transform",
                    "fields": [
                        { "name": "x", "kind": "f32" },
                        { "name": "y", "kind": "f32" }
                    ]
                }
            ]
        }"#;
        let config: WorldConfig = serde_json::from_str(json).unwrap();
        let mut world = World::from_config(config).unwrap();
        assert_eq!(world.capacity(), 32);
        let e = world.spawn().unwrap();
        world.add(e, "Transform", &[("x", Value::F32(1.0))]).unwrap();
        assert!(world.has(e, "Transform"));
    }
}
