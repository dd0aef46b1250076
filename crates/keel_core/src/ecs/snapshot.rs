//! Column snapshot surface for serialization collaborators.
//!
//! The World exposes, per component, a parallel pair: the entity ids that
//! carry the component and borrowed views of its field arrays. Gathering,
//! delta compression, and wire framing belong to the consumer; nothing here
//! encodes anything.

use crate::ecs::component::FieldKind;
use crate::ecs::entity::EntityId;
use crate::ecs::storage::FieldArray;

/// Borrowed view of one field column.
pub struct FieldColumn<'w> {
    pub name: &'w str,
    pub kind: FieldKind,
    /// The full array, indexed by entity id. Only the slots named in the
    /// snapshot's entity list are meaningful.
    pub values: &'w FieldArray,
}

/// One component's columns plus the ids whose slots are live in them.
pub struct ComponentSnapshot<'w> {
    pub component: &'w str,
    pub entities: Vec<EntityId>,
    pub fields: Vec<FieldColumn<'w>>,
}

impl ComponentSnapshot<'_> {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}
