//! Property store
//!
//! An identity-keyed side table where upper layers stash renderer-internal
//! state derived from a resource (cached clipping buffers, program handles)
//! without adding fields to the resource itself. Records are created on first
//! access and dropped explicitly when their resource is disposed.

use std::any::Any;
use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::resources::{BufferId, GeometryId, MaterialId, TextureId};
use crate::scene::MeshId;

/// Identity of any resource that may own a property record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Geometry(GeometryId),
    Material(MaterialId),
    Mesh(MeshId),
    Texture(TextureId),
    Buffer(BufferId),
}

impl From<MaterialId> for ResourceKey {
    fn from(id: MaterialId) -> Self {
        Self::Material(id)
    }
}

impl From<GeometryId> for ResourceKey {
    fn from(id: GeometryId) -> Self {
        Self::Geometry(id)
    }
}

impl From<MeshId> for ResourceKey {
    fn from(id: MeshId) -> Self {
        Self::Mesh(id)
    }
}

/// Open key/value record attached to one resource.
#[derive(Debug, Default)]
pub struct PropertyRecord {
    values: FxHashMap<&'static str, Box<dyn Any>>,
}

impl PropertyRecord {
    #[must_use]
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    pub fn insert<T: Any>(&mut self, key: &'static str, value: T) {
        self.values.insert(key, Box::new(value));
    }

    /// Returns the value under `key`, initialising it (or replacing a value of
    /// another type) with `init`.
    pub fn get_or_insert_with<T: Any>(
        &mut self,
        key: &'static str,
        init: impl FnOnce() -> T,
    ) -> Option<&mut T> {
        match self.values.entry(key) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                if !slot.is::<T>() {
                    *slot = Box::new(init());
                }
                slot.downcast_mut::<T>()
            }
            Entry::Vacant(entry) => entry.insert(Box::new(init())).downcast_mut::<T>(),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PropertyStore {
    records: FxHashMap<ResourceKey, PropertyRecord>,
}

impl PropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `key`, created empty on first access.
    pub fn get(&mut self, key: impl Into<ResourceKey>) -> &mut PropertyRecord {
        self.records.entry(key.into()).or_default()
    }

    /// Read-only lookup that never creates a record.
    #[must_use]
    pub fn peek(&self, key: impl Into<ResourceKey>) -> Option<&PropertyRecord> {
        self.records.get(&key.into())
    }

    pub fn update<T: Any>(&mut self, key: impl Into<ResourceKey>, name: &'static str, value: T) {
        self.get(key).insert(name, value);
    }

    pub fn remove(&mut self, key: impl Into<ResourceKey>) -> bool {
        self.records.remove(&key.into()).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record.
    pub fn dispose(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_auto_vivifies_records() {
        let mut store = PropertyStore::new();
        let id = crate::resources::Material::new("m").id();
        assert!(store.peek(id).is_none());
        assert!(store.get(id).is_empty());
        assert_eq!(store.len(), 1);
        store.update(id, "program", 7u32);
        assert_eq!(store.peek(id).and_then(|r| r.get::<u32>("program")), Some(&7));
        store.dispose();
        assert!(store.is_empty());
    }

    #[test]
    fn get_or_insert_with_replaces_other_types() {
        let mut record = PropertyRecord::default();
        record.insert("state", 1.5f32);
        let v: &mut Vec<f32> = record.get_or_insert_with("state", Vec::new).unwrap();
        v.push(2.0);
        assert_eq!(record.get::<Vec<f32>>("state"), Some(&vec![2.0]));
        assert!(record.get::<f32>("state").is_none());
    }

    #[test]
    fn get_or_insert_with_keeps_matching_values() {
        let mut record = PropertyRecord::default();
        assert_eq!(record.get_or_insert_with("count", || 3u32), Some(&mut 3));
        assert_eq!(record.get_or_insert_with("count", || 9u32), Some(&mut 3));
        assert_eq!(record.len(), 1);
    }
}
