use rustc_hash::FxHashMap;

use super::device::{GpuDevice, VertexArrayHandle};
use crate::resources::{GeometryId, MaterialId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct BindingKey {
    material: MaterialId,
    wireframe: bool,
}

/// Vertex-array objects per (geometry, material, wireframe) combination.
#[derive(Debug, Default)]
pub struct BindingStates {
    states: FxHashMap<GeometryId, FxHashMap<BindingKey, VertexArrayHandle>>,
}

impl BindingStates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the VAO for the combination, creating it on first use.
    pub fn setup(
        &mut self,
        device: &mut dyn GpuDevice,
        geometry: GeometryId,
        material: MaterialId,
        wireframe: bool,
    ) -> VertexArrayHandle {
        *self
            .states
            .entry(geometry)
            .or_default()
            .entry(BindingKey { material, wireframe })
            .or_insert_with(|| device.create_vertex_array())
    }

    /// Drops every VAO built for `geometry`; returns how many were released.
    pub fn release_states_of_geometry(
        &mut self,
        device: &mut dyn GpuDevice,
        geometry: GeometryId,
    ) -> usize {
        let Some(states) = self.states.remove(&geometry) else {
            return 0;
        };
        let count = states.len();
        for vao in states.into_values() {
            device.delete_vertex_array(vao);
        }
        count
    }

    pub fn release_states_of_material(
        &mut self,
        device: &mut dyn GpuDevice,
        material: MaterialId,
    ) -> usize {
        let mut count = 0;
        for states in self.states.values_mut() {
            states.retain(|key, vao| {
                if key.material == material {
                    device.delete_vertex_array(*vao);
                    count += 1;
                    false
                } else {
                    true
                }
            });
        }
        self.states.retain(|_, states| !states.is_empty());
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.values().map(FxHashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dispose(&mut self, device: &mut dyn GpuDevice) {
        for (_, states) in self.states.drain() {
            for vao in states.into_values() {
                device.delete_vertex_array(vao);
            }
        }
    }
}
