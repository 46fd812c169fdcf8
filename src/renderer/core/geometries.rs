//! Geometry registry
//!
//! Tracks which buffer geometries the renderer has seen and owns the GPU state
//! derived from them: attribute buffers (through [`AttributeCache`]), derived
//! wireframe indices and vertex bindings.
//!
//! # Disposal
//!
//! There is no implicit cleanup. The owner of a geometry calls
//! [`GeometryRegistry::dispose_geometry`] when it destroys it; the call
//! releases the index buffer, every attribute buffer, the wireframe index and
//! the bindings exactly once. Disposing an unknown or already disposed
//! geometry is a no-op.

use rustc_hash::{FxHashMap, FxHashSet};

use super::attributes::AttributeCache;
use super::bindings::BindingStates;
use super::device::GpuDevice;
use super::info::RenderInfo;
use crate::resources::{Attribute, BufferGeometry, BufferId, Geometry, GeometryId};

/// What [`GeometryRegistry::dispose_geometry`] released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub index: bool,
    pub attributes: usize,
    pub wireframe: bool,
    pub bindings: usize,
}

#[derive(Debug)]
struct Wireframe {
    attribute: Attribute,
    /// Buffer the edges were derived from
    source: BufferId,
}

#[derive(Debug, Default)]
pub struct GeometryRegistry {
    registered: FxHashSet<GeometryId>,
    wireframes: FxHashMap<GeometryId, Wireframe>,
    attributes: AttributeCache,
    bindings: BindingStates,
}

impl GeometryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `geometry` to its buffer form and registers it on first sight.
    pub fn get<'g>(&mut self, info: &mut RenderInfo, geometry: &'g Geometry) -> &'g BufferGeometry {
        let buffer_geometry = geometry.buffer_geometry();
        if self.registered.insert(buffer_geometry.id()) {
            info.memory.geometries += 1;
        }
        buffer_geometry
    }

    #[must_use]
    pub fn is_registered(&self, id: GeometryId) -> bool {
        self.registered.contains(&id)
    }

    /// Pushes every attribute (morph targets included) through the cache.
    ///
    /// The index is not uploaded here; the draw path does that, since a
    /// wireframe draw binds the derived index instead.
    pub fn update(&mut self, device: &mut dyn GpuDevice, geometry: &BufferGeometry) {
        for (_, attribute) in geometry.attributes() {
            self.attributes
                .update(device, attribute, wgpu::BufferUsages::VERTEX);
        }
        for attribute in geometry.morph_attributes() {
            self.attributes
                .update(device, attribute, wgpu::BufferUsages::VERTEX);
        }
    }

    /// The line-list index for drawing `geometry` as wireframe.
    ///
    /// Built on first request and rebuilt when the source index (or the
    /// position attribute, for unindexed geometry) has a newer version than
    /// the cached one. A rebuilt index replaces the old GPU buffer.
    pub fn wireframe_attribute(
        &mut self,
        device: &mut dyn GpuDevice,
        geometry: &BufferGeometry,
    ) -> Option<&Attribute> {
        let id = geometry.id();
        let source = match (geometry.index(), geometry.position()) {
            (Some(index), _) => index,
            (None, Some(position)) => position,
            (None, None) => {
                log::warn!(
                    "GeometryRegistry: wireframe requested for geometry {:?} without index or position",
                    geometry.label
                );
                return None;
            }
        };

        let stale = self.wireframes.get(&id).is_none_or(|wire| {
            wire.source != source.id() || wire.attribute.version() < source.version()
        });
        if stale {
            let wire = Wireframe {
                attribute: build_wireframe(geometry, source.version()),
                source: source.id(),
            };
            if let Some(previous) = self.wireframes.insert(id, wire) {
                self.attributes.remove(device, &previous.attribute);
            }
        }
        self.wireframes.get(&id).map(|wire| &wire.attribute)
    }

    /// Releases all GPU state owned for `geometry`.
    pub fn dispose_geometry(
        &mut self,
        device: &mut dyn GpuDevice,
        info: &mut RenderInfo,
        geometry: &BufferGeometry,
    ) -> DisposeReport {
        let id = geometry.id();
        if !self.registered.remove(&id) {
            return DisposeReport::default();
        }

        let mut report = DisposeReport::default();
        if let Some(index) = geometry.index() {
            report.index = self.attributes.remove(device, index);
        }
        for (_, attribute) in geometry.attributes() {
            if self.attributes.remove(device, attribute) {
                report.attributes += 1;
            }
        }
        for attribute in geometry.morph_attributes() {
            if self.attributes.remove(device, attribute) {
                report.attributes += 1;
            }
        }
        if let Some(wire) = self.wireframes.remove(&id) {
            self.attributes.remove(device, &wire.attribute);
            report.wireframe = true;
        }
        report.bindings = self.bindings.release_states_of_geometry(device, id);

        info.memory.geometries = info.memory.geometries.saturating_sub(1);
        log::debug!(
            "GeometryRegistry: disposed geometry {:?} ({} attribute buffers)",
            id,
            report.attributes
        );
        report
    }

    /// Disposes the buffer form of a logical geometry.
    pub fn dispose(
        &mut self,
        device: &mut dyn GpuDevice,
        info: &mut RenderInfo,
        geometry: &Geometry,
    ) -> DisposeReport {
        match geometry {
            Geometry::Buffer(buffer) => self.dispose_geometry(device, info, buffer),
            // An unconverted polygon geometry never reached the GPU.
            Geometry::Polygon(polygon) if !polygon.is_converted() => DisposeReport::default(),
            Geometry::Polygon(polygon) => {
                self.dispose_geometry(device, info, polygon.to_buffer_geometry())
            }
        }
    }

    #[must_use]
    pub fn has_wireframe(&self, id: GeometryId) -> bool {
        self.wireframes.contains_key(&id)
    }

    #[must_use]
    pub fn attributes(&self) -> &AttributeCache {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeCache {
        &mut self.attributes
    }

    #[must_use]
    pub fn bindings(&self) -> &BindingStates {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut BindingStates {
        &mut self.bindings
    }

    /// Releases everything, e.g. on context loss.
    pub fn release_all(&mut self, device: &mut dyn GpuDevice) {
        self.attributes.dispose(device);
        self.bindings.dispose(device);
        self.wireframes.clear();
        self.registered.clear();
    }
}

/// Edges (a,b), (b,c), (c,a) for every triangle.
fn build_wireframe(geometry: &BufferGeometry, source_version: u64) -> Attribute {
    let mut indices: Vec<u32> = Vec::new();

    if let Some(index) = geometry.index() {
        let store = index.buffer();
        let triangles = store.len() / 3;
        indices.reserve(triangles * 6);
        for t in 0..triangles {
            let (Some(a), Some(b), Some(c)) = (
                store.index_at(t * 3),
                store.index_at(t * 3 + 1),
                store.index_at(t * 3 + 2),
            ) else {
                continue;
            };
            indices.extend_from_slice(&[a, b, b, c, c, a]);
        }
    } else if let Some(position) = geometry.position() {
        // Only whole triangles; a trailing partial triple is ignored.
        let triangles = position.count() / 3;
        indices.reserve(triangles * 6);
        for t in 0..triangles as u32 {
            let (a, b, c) = (t * 3, t * 3 + 1, t * 3 + 2);
            indices.extend_from_slice(&[a, b, b, c, c, a]);
        }
    }

    let wide = indices.iter().any(|&i| i >= 65_535);
    let attribute = if wide {
        Attribute::new(&indices, 1)
    } else {
        let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
        Attribute::new(&narrow, 1)
    };
    attribute.buffer().set_version(source_version);
    attribute
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ElementType;

    #[test]
    fn wireframe_of_indexed_triangle() {
        let mut geometry = BufferGeometry::new();
        geometry.set_attribute("position", Attribute::new(&[0.0f32; 9], 3));
        geometry.set_indices(&[0, 1, 2]);
        let wire = build_wireframe(&geometry, 0);
        let store = wire.buffer();
        let edges: Vec<u32> = (0..store.len()).filter_map(|i| store.index_at(i)).collect();
        assert_eq!(edges, vec![0, 1, 1, 2, 2, 0]);
        assert_eq!(wire.element_type(), ElementType::UnsignedShort);
    }

    #[test]
    fn wide_indices_use_u32() {
        let mut geometry = BufferGeometry::new();
        geometry.set_indices_u32(&[0, 70_000, 2]);
        let wire = build_wireframe(&geometry, 3);
        assert_eq!(wire.element_type(), ElementType::UnsignedInt);
        assert_eq!(wire.version(), 3);
    }

    #[test]
    fn unindexed_ignores_partial_triangles() {
        let mut geometry = BufferGeometry::new();
        geometry.set_attribute("position", Attribute::new(&[0.0f32; 12], 3));
        let wire = build_wireframe(&geometry, 0);
        assert_eq!(wire.buffer().len(), 6);
    }
}
