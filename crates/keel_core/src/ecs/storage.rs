// storage.rs - Columnar component storage
//
// One ColumnStore per registered component. Each field of the component
// gets its own packed primitive array of length N (the world's entity
// capacity); slot i of every array jointly holds the record attached to
// entity id i. Arrays are allocated once at world construction and never
// reallocated, which is what makes raw column references stable.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ecs::component::{ComponentDescriptor, FieldKind, Value};
use crate::ecs::entity::EntityId;
use crate::ecs::error::EcsError;

/// Shared layout data for one component: field names, kinds, and the
/// precomputed name -> index table used by partial writes.
#[derive(Debug)]
pub(crate) struct FieldLayout {
    pub(crate) component: String,
    pub(crate) names: Vec<String>,
    pub(crate) kinds: Vec<FieldKind>,
    index_of: HashMap<String, usize>,
    stride: usize,
}

impl FieldLayout {
    fn new(desc: &ComponentDescriptor) -> Self {
        let names: Vec<String> = desc.fields().iter().map(|f| f.name.clone()).collect();
        let kinds: Vec<FieldKind> = desc.fields().iter().map(|f| f.kind).collect();
        let index_of = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self {
            component: desc.name().to_string(),
            names,
            kinds,
            index_of,
            stride: desc.stride(),
        }
    }

    #[inline]
    pub(crate) fn index_of(&self, field: &str) -> Option<usize> {
        self.index_of.get(field).copied()
    }
}

/// A packed primitive array holding one field across all entity ids.
#[derive(Debug)]
pub enum FieldArray {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

impl FieldArray {
    fn zeroed(kind: FieldKind, len: usize) -> Self {
        match kind {
            FieldKind::U8 => FieldArray::U8(vec![0; len]),
            FieldKind::U16 => FieldArray::U16(vec![0; len]),
            FieldKind::U32 => FieldArray::U32(vec![0; len]),
            FieldKind::I32 => FieldArray::I32(vec![0; len]),
            FieldKind::F32 => FieldArray::F32(vec![0.0; len]),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldArray::U8(_) => FieldKind::U8,
            FieldArray::U16(_) => FieldKind::U16,
            FieldArray::U32(_) => FieldKind::U32,
            FieldArray::I32(_) => FieldKind::I32,
            FieldArray::F32(_) => FieldKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldArray::U8(v) => v.len(),
            FieldArray::U16(v) => v.len(),
            FieldArray::U32(v) => v.len(),
            FieldArray::I32(v) => v.len(),
            FieldArray::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, eid: EntityId) -> Value {
        let i = eid as usize;
        match self {
            FieldArray::U8(v) => Value::U8(v[i]),
            FieldArray::U16(v) => Value::U16(v[i]),
            FieldArray::U32(v) => Value::U32(v[i]),
            FieldArray::I32(v) => Value::I32(v[i]),
            FieldArray::F32(v) => Value::F32(v[i]),
        }
    }

    /// Write one slot. The value kind must match the array kind; a mismatch
    /// is a caller bug upstream of the registration-time validation.
    #[inline]
    pub fn set(&mut self, eid: EntityId, value: Value) {
        let i = eid as usize;
        match (self, value) {
            (FieldArray::U8(v), Value::U8(x)) => v[i] = x,
            (FieldArray::U16(v), Value::U16(x)) => v[i] = x,
            (FieldArray::U32(v), Value::U32(x)) => v[i] = x,
            (FieldArray::I32(v), Value::I32(x)) => v[i] = x,
            (FieldArray::F32(v), Value::F32(x)) => v[i] = x,
            (arr, val) => panic!(
                "field kind mismatch: array holds {:?}, got {:?}",
                arr.kind(),
                val.kind()
            ),
        }
    }

    #[inline]
    pub fn clear_slot(&mut self, eid: EntityId) {
        let i = eid as usize;
        match self {
            FieldArray::U8(v) => v[i] = 0,
            FieldArray::U16(v) => v[i] = 0,
            FieldArray::U32(v) => v[i] = 0,
            FieldArray::I32(v) => v[i] = 0,
            FieldArray::F32(v) => v[i] = 0.0,
        }
    }

    /// Typed view for serialization collaborators.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            FieldArray::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            FieldArray::U16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            FieldArray::U32(v) => Some(v),
            _ => None,
        }
    }

    fn raw(&mut self) -> RawColumn {
        match self {
            FieldArray::U8(v) => RawColumn::U8(v.as_mut_ptr()),
            FieldArray::U16(v) => RawColumn::U16(v.as_mut_ptr()),
            FieldArray::U32(v) => RawColumn::U32(v.as_mut_ptr()),
            FieldArray::I32(v) => RawColumn::I32(v.as_mut_ptr()),
            FieldArray::F32(v) => RawColumn::F32(v.as_mut_ptr()),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum RawColumn {
    U8(*mut u8),
    U16(*mut u16),
    U32(*mut u32),
    I32(*mut i32),
    F32(*mut f32),
}

/// Direct reference to a single field's column array.
///
/// This is the raw-access contract systems rely on in tight loops: resolve
/// once at registration time, then index by entity id at will. The backing
/// array lives for the lifetime of the owning World and is never moved or
/// reallocated, so the reference stays valid until the World is dropped.
///
/// A `FieldRef` is deliberately `!Send`/`!Sync`: the World and everything
/// pointing into it belong to one thread of control (see the concurrency
/// contract on [`World`](crate::ecs::World)).
///
/// # Safety
///
/// All accessors bounds-check in debug builds only. Indexing with an id
/// outside `[0, capacity)` is a caller bug, same as any out-of-range column
/// access from a system callback.
#[derive(Copy, Clone, Debug)]
pub struct FieldRef {
    raw: RawColumn,
    len: usize,
}

impl FieldRef {
    pub fn kind(&self) -> FieldKind {
        match self.raw {
            RawColumn::U8(_) => FieldKind::U8,
            RawColumn::U16(_) => FieldKind::U16,
            RawColumn::U32(_) => FieldKind::U32,
            RawColumn::I32(_) => FieldKind::I32,
            RawColumn::F32(_) => FieldKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, eid: EntityId) -> Value {
        let i = eid as usize;
        debug_assert!(i < self.len);
        // Safety: arrays are allocated at world construction with length
        // `capacity` and never reallocated; the pointer is valid for reads
        // at any index below `len` while the World is alive.
        unsafe {
            match self.raw {
                RawColumn::U8(p) => Value::U8(*p.add(i)),
                RawColumn::U16(p) => Value::U16(*p.add(i)),
                RawColumn::U32(p) => Value::U32(*p.add(i)),
                RawColumn::I32(p) => Value::I32(*p.add(i)),
                RawColumn::F32(p) => Value::F32(*p.add(i)),
            }
        }
    }

    #[inline]
    pub fn set(&self, eid: EntityId, value: Value) {
        let i = eid as usize;
        debug_assert!(i < self.len);
        // Safety: see `get`. Writes are exclusive within a tick because the
        // world model is single-threaded cooperative.
        unsafe {
            match (self.raw, value) {
                (RawColumn::U8(p), Value::U8(x)) => *p.add(i) = x,
                (RawColumn::U16(p), Value::U16(x)) => *p.add(i) = x,
                (RawColumn::U32(p), Value::U32(x)) => *p.add(i) = x,
                (RawColumn::I32(p), Value::I32(x)) => *p.add(i) = x,
                (RawColumn::F32(p), Value::F32(x)) => *p.add(i) = x,
                (_, val) => panic!(
                    "field kind mismatch: column holds {:?}, got {:?}",
                    self.kind(),
                    val.kind()
                ),
            }
        }
    }

    /// Typed fast path; debug-asserts the column kind.
    #[inline]
    pub fn f32(&self, eid: EntityId) -> f32 {
        let i = eid as usize;
        debug_assert!(i < self.len);
        match self.raw {
            // Safety: see `get`.
            RawColumn::F32(p) => unsafe { *p.add(i) },
            _ => panic!("column is not f32"),
        }
    }

    #[inline]
    pub fn set_f32(&self, eid: EntityId, value: f32) {
        let i = eid as usize;
        debug_assert!(i < self.len);
        match self.raw {
            // Safety: see `set`.
            RawColumn::F32(p) => unsafe { *p.add(i) = value },
            _ => panic!("column is not f32"),
        }
    }

    #[inline]
    pub fn u16(&self, eid: EntityId) -> u16 {
        let i = eid as usize;
        debug_assert!(i < self.len);
        match self.raw {
            // Safety: see `get`.
            RawColumn::U16(p) => unsafe { *p.add(i) },
            _ => panic!("column is not u16"),
        }
    }

    #[inline]
    pub fn set_u16(&self, eid: EntityId, value: u16) {
        let i = eid as usize;
        debug_assert!(i < self.len);
        match self.raw {
            // Safety: see `set`.
            RawColumn::U16(p) => unsafe { *p.add(i) = value },
            _ => panic!("column is not u16"),
        }
    }

    #[inline]
    pub fn u32(&self, eid: EntityId) -> u32 {
        let i = eid as usize;
        debug_assert!(i < self.len);
        match self.raw {
            // Safety: see `get`.
            RawColumn::U32(p) => unsafe { *p.add(i) },
            _ => panic!("column is not u32"),
        }
    }

    #[inline]
    pub fn set_u32(&self, eid: EntityId, value: u32) {
        let i = eid as usize;
        debug_assert!(i < self.len);
        match self.raw {
            // Safety: see `set`.
            RawColumn::U32(p) => unsafe { *p.add(i) = value },
            _ => panic!("column is not u32"),
        }
    }
}

/// A struct-shaped component value: one [`Value`] per declared field, in
/// declaration order.
#[derive(Clone, Debug)]
pub struct Record {
    values: Box<[Value]>,
    layout: Arc<FieldLayout>,
}

impl Record {
    fn zeroed(layout: Arc<FieldLayout>) -> Self {
        let values = layout.kinds.iter().map(|k| k.zero()).collect();
        Self { values, layout }
    }

    pub fn component(&self) -> &str {
        &self.layout.component
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.layout.index_of(field).map(|i| self.values[i])
    }

    pub fn set(&mut self, field: &str, value: Value) -> Result<(), EcsError> {
        match self.layout.index_of(field) {
            Some(i) => {
                self.values[i] = value;
                Ok(())
            }
            None => Err(EcsError::UnknownField {
                component: self.layout.component.clone(),
                field: field.to_string(),
            }),
        }
    }

    pub fn field_names(&self) -> &[String] {
        &self.layout.names
    }
}

/// Columnar storage for one component across all entity ids.
///
/// Gameplay operations never allocate: the read path reuses a single
/// store-owned scratch record, and all arrays are pre-sized to the world
/// capacity.
pub struct ColumnStore {
    layout: Arc<FieldLayout>,
    fields: Box<[FieldArray]>,
    scratch: Record,
}

impl ColumnStore {
    pub(crate) fn new(desc: &ComponentDescriptor, capacity: usize) -> Self {
        let layout = Arc::new(FieldLayout::new(desc));
        let fields = desc
            .fields()
            .iter()
            .map(|f| FieldArray::zeroed(f.kind, capacity))
            .collect();
        let scratch = Record::zeroed(layout.clone());
        Self {
            layout,
            fields,
            scratch,
        }
    }

    pub fn component(&self) -> &str {
        &self.layout.component
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Total byte width of one record.
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    pub(crate) fn field_index(&self, field: &str) -> Option<usize> {
        self.layout.index_of(field)
    }

    /// A fresh zeroed record shaped like this component.
    pub fn blank_record(&self) -> Record {
        Record::zeroed(self.layout.clone())
    }

    /// Copy every field of `record` into slot `eid`. No liveness check.
    ///
    /// Small records get a straight-line copy; they dominate real schemas.
    pub fn write(&mut self, eid: EntityId, record: &Record) {
        debug_assert_eq!(record.values.len(), self.fields.len());
        let v = &record.values;
        match self.fields.len() {
            0 => {}
            1 => self.fields[0].set(eid, v[0]),
            2 => {
                self.fields[0].set(eid, v[0]);
                self.fields[1].set(eid, v[1]);
            }
            3 => {
                self.fields[0].set(eid, v[0]);
                self.fields[1].set(eid, v[1]);
                self.fields[2].set(eid, v[2]);
            }
            4 => {
                self.fields[0].set(eid, v[0]);
                self.fields[1].set(eid, v[1]);
                self.fields[2].set(eid, v[2]);
                self.fields[3].set(eid, v[3]);
            }
            _ => {
                for (arr, &val) in self.fields.iter_mut().zip(v.iter()) {
                    arr.set(eid, val);
                }
            }
        }
    }

    /// Check that every named field exists, without writing anything.
    /// Lets callers keep a record untouched when a batch would fail midway.
    pub fn validate_fields(&self, fields: &[(&str, Value)]) -> Result<(), EcsError> {
        for &(name, _) in fields {
            if self.layout.index_of(name).is_none() {
                return Err(EcsError::UnknownField {
                    component: self.layout.component.clone(),
                    field: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Write a subset of fields at slot `eid`. Unmentioned fields are left
    /// untouched. Each name costs exactly one index resolution.
    pub fn write_fields(
        &mut self,
        eid: EntityId,
        fields: &[(&str, Value)],
    ) -> Result<(), EcsError> {
        for &(name, value) in fields {
            let idx = self
                .layout
                .index_of(name)
                .ok_or_else(|| EcsError::UnknownField {
                    component: self.layout.component.clone(),
                    field: name.to_string(),
                })?;
            self.fields[idx].set(eid, value);
        }
        Ok(())
    }

    /// Populate the store-owned scratch record from slot `eid` and return it.
    ///
    /// The returned reference is scratch: it is only valid until the next
    /// read on this store. Callers that need to retain values copy them out
    /// (or use [`read_copy`](Self::read_copy)).
    pub fn read(&mut self, eid: EntityId) -> &Record {
        let v = &mut self.scratch.values;
        match self.fields.len() {
            0 => {}
            1 => v[0] = self.fields[0].get(eid),
            2 => {
                v[0] = self.fields[0].get(eid);
                v[1] = self.fields[1].get(eid);
            }
            3 => {
                v[0] = self.fields[0].get(eid);
                v[1] = self.fields[1].get(eid);
                v[2] = self.fields[2].get(eid);
            }
            4 => {
                v[0] = self.fields[0].get(eid);
                v[1] = self.fields[1].get(eid);
                v[2] = self.fields[2].get(eid);
                v[3] = self.fields[3].get(eid);
            }
            _ => {
                for (slot, arr) in v.iter_mut().zip(self.fields.iter()) {
                    *slot = arr.get(eid);
                }
            }
        }
        &self.scratch
    }

    /// Fresh copy of the record at slot `eid`. Allocates; fine off the hot
    /// path.
    pub fn read_copy(&self, eid: EntityId) -> Record {
        let values = self.fields.iter().map(|arr| arr.get(eid)).collect();
        Record {
            values,
            layout: self.layout.clone(),
        }
    }

    /// Reset slot `eid` to the zero value of every field.
    pub fn clear(&mut self, eid: EntityId) {
        for arr in self.fields.iter_mut() {
            arr.clear_slot(eid);
        }
    }

    /// Stable raw reference to one field's column array.
    pub fn field(&mut self, name: &str) -> Result<FieldRef, EcsError> {
        let idx = self
            .layout
            .index_of(name)
            .ok_or_else(|| EcsError::UnknownField {
                component: self.layout.component.clone(),
                field: name.to_string(),
            })?;
        Ok(self.field_ref_at(idx))
    }

    pub(crate) fn field_ref_at(&mut self, idx: usize) -> FieldRef {
        let len = self.fields[idx].len();
        FieldRef {
            raw: self.fields[idx].raw(),
            len,
        }
    }

    /// Borrowed view of one field array (snapshot surface).
    pub fn field_array(&self, idx: usize) -> &FieldArray {
        &self.fields[idx]
    }

    pub(crate) fn layout(&self) -> &Arc<FieldLayout> {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::ComponentDescriptor;

    fn transform_store(capacity: usize) -> ColumnStore {
        let desc = ComponentDescriptor::new("Transform")
            .field("x", FieldKind::F32)
            .field("y", FieldKind::F32)
            .field("rot", FieldKind::F32);
        ColumnStore::new(&desc, capacity)
    }

    #[test]
    fn test_write_read_round_trip() {
        let mut store = transform_store(8);
        let mut rec = store.blank_record();
        rec.set("x", Value::F32(1.5)).unwrap();
        rec.set("y", Value::F32(-2.0)).unwrap();
        rec.set("rot", Value::F32(0.25)).unwrap();
        store.write(3, &rec);

        let got = store.read(3);
        assert_eq!(got.get("x"), Some(Value::F32(1.5)));
        assert_eq!(got.get("y"), Some(Value::F32(-2.0)));
        assert_eq!(got.get("rot"), Some(Value::F32(0.25)));
    }

    #[test]
    fn test_partial_write_leaves_other_fields() {
        let mut store = transform_store(4);
        store
            .write_fields(1, &[("x", Value::F32(10.0)), ("y", Value::F32(20.0))])
            .unwrap();
        store.write_fields(1, &[("x", Value::F32(99.0))]).unwrap();

        let got = store.read(1);
        assert_eq!(got.get("x"), Some(Value::F32(99.0)));
        assert_eq!(got.get("y"), Some(Value::F32(20.0)));
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let mut store = transform_store(4);
        let err = store.write_fields(0, &[("vx", Value::F32(1.0))]).unwrap_err();
        assert!(matches!(err, EcsError::UnknownField { .. }));
    }

    #[test]
    fn test_clear_zeroes_the_slot() {
        let mut store = transform_store(4);
        store
            .write_fields(2, &[("x", Value::F32(7.0)), ("rot", Value::F32(3.0))])
            .unwrap();
        store.clear(2);
        let got = store.read(2);
        assert_eq!(got.get("x"), Some(Value::F32(0.0)));
        assert_eq!(got.get("rot"), Some(Value::F32(0.0)));
    }

    #[test]
    fn test_scratch_is_reused_between_reads() {
        let mut store = transform_store(4);
        store.write_fields(0, &[("x", Value::F32(1.0))]).unwrap();
        store.write_fields(1, &[("x", Value::F32(2.0))]).unwrap();

        let first = store.read(0).get("x");
        assert_eq!(first, Some(Value::F32(1.0)));
        // The next read overwrites the same scratch record.
        let second = store.read(1).get("x");
        assert_eq!(second, Some(Value::F32(2.0)));
    }

    #[test]
    fn test_field_ref_reads_and_writes() {
        let mut store = transform_store(8);
        let xs = store.field("x").unwrap();
        xs.set_f32(5, 42.0);
        assert_eq!(xs.f32(5), 42.0);
        assert_eq!(store.read(5).get("x"), Some(Value::F32(42.0)));
        assert_eq!(xs.kind(), FieldKind::F32);
        assert_eq!(xs.len(), 8);
    }

    #[test]
    fn test_stride() {
        let store = transform_store(1);
        assert_eq!(store.stride(), 12);
    }
}
