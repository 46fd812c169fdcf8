use rustc_hash::{FxHashMap, FxHashSet};

use super::device::GpuDevice;
use super::geometries::GeometryRegistry;
use super::info::RenderInfo;
use crate::resources::{BufferGeometry, Geometry, GeometryId};
use crate::scene::{Mesh, MeshId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum UpdateKey {
    Geometry(GeometryId),
    Instances(MeshId),
}

/// Per-object upload front end.
///
/// Geometry uploads run at most once per frame per buffer geometry, however
/// many meshes share it; the frame number comes from [`RenderInfo`].
#[derive(Debug, Default)]
pub struct ObjectCache {
    geometries: GeometryRegistry,
    update_map: FxHashMap<UpdateKey, u64>,
    instanced: FxHashSet<MeshId>,
}

impl ObjectCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves and uploads the geometry of `mesh` for the current frame.
    pub fn update<'g>(
        &mut self,
        device: &mut dyn GpuDevice,
        info: &mut RenderInfo,
        mesh: &Mesh,
        geometry: &'g Geometry,
    ) -> &'g BufferGeometry {
        let frame = info.render.frame;
        let buffer_geometry = self.geometries.get(info, geometry);

        let key = UpdateKey::Geometry(buffer_geometry.id());
        if self.update_map.get(&key) != Some(&frame) {
            self.geometries.update(device, buffer_geometry);
            self.update_map.insert(key, frame);
        }

        if let Some(instances) = &mesh.instances {
            self.instanced.insert(mesh.id());
            let key = UpdateKey::Instances(mesh.id());
            if self.update_map.get(&key) != Some(&frame) {
                let attributes = self.geometries.attributes_mut();
                attributes.update(device, &instances.matrices, wgpu::BufferUsages::VERTEX);
                if let Some(colors) = &instances.colors {
                    attributes.update(device, colors, wgpu::BufferUsages::VERTEX);
                }
                self.update_map.insert(key, frame);
            }
        }

        buffer_geometry
    }

    /// Releases the instance buffers of an instanced mesh. Calling it again,
    /// or for a mesh that was never drawn instanced, does nothing.
    pub fn dispose_mesh(&mut self, device: &mut dyn GpuDevice, mesh: &Mesh) -> bool {
        if !self.instanced.remove(&mesh.id()) {
            return false;
        }
        self.update_map.remove(&UpdateKey::Instances(mesh.id()));
        if let Some(instances) = &mesh.instances {
            let attributes = self.geometries.attributes_mut();
            attributes.remove(device, &instances.matrices);
            if let Some(colors) = &instances.colors {
                attributes.remove(device, colors);
            }
        }
        true
    }

    /// Forgets the frame stamp of a disposed geometry.
    pub(crate) fn forget_geometry(&mut self, id: GeometryId) {
        self.update_map.remove(&UpdateKey::Geometry(id));
    }

    #[must_use]
    pub fn geometries(&self) -> &GeometryRegistry {
        &self.geometries
    }

    pub fn geometries_mut(&mut self) -> &mut GeometryRegistry {
        &mut self.geometries
    }

    /// Clears the frame stamps.
    pub fn dispose(&mut self) {
        self.update_map.clear();
    }
}
