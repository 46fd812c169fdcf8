use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec4;
use slotmap::SlotMap;

use super::mesh::Mesh;
use super::{GeometryKey, MaterialKey, MeshKey};
use crate::resources::{Geometry, Material};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u32);

/// Flat scene container.
///
/// Scene is a pure data layer: it owns geometries, materials and meshes in
/// slot maps. Meshes refer to the other two by key. GPU state derived from
/// these lives in the renderer's caches, keyed by resource id; removing a
/// resource from the scene hands it back so the caller can release that
/// state through the renderer.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    pub name: String,
    pub geometries: SlotMap<GeometryKey, Geometry>,
    pub materials: SlotMap<MaterialKey, Material>,
    pub meshes: SlotMap<MeshKey, Mesh>,

    /// Solid background; forces a clear before drawing when set
    pub background: Option<Vec4>,
    /// Replaces every mesh material while set
    pub override_material: Option<MaterialKey>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed)),
            name: "Scene".to_string(),
            geometries: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            background: None,
            override_material: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn add_geometry(&mut self, geometry: impl Into<Geometry>) -> GeometryKey {
        self.geometries.insert(geometry.into())
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshKey {
        self.meshes.insert(mesh)
    }

    #[must_use]
    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    #[must_use]
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    #[must_use]
    pub fn mesh(&self, key: MeshKey) -> Option<&Mesh> {
        self.meshes.get(key)
    }

    pub fn mesh_mut(&mut self, key: MeshKey) -> Option<&mut Mesh> {
        self.meshes.get_mut(key)
    }

    /// Removes a geometry. Meshes still referring to it fail to render.
    pub fn remove_geometry(&mut self, key: GeometryKey) -> Option<Geometry> {
        self.geometries.remove(key)
    }

    pub fn remove_material(&mut self, key: MaterialKey) -> Option<Material> {
        self.materials.remove(key)
    }

    pub fn remove_mesh(&mut self, key: MeshKey) -> Option<Mesh> {
        self.meshes.remove(key)
    }
}
