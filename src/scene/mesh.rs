use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Affine3A, Mat4, Vec3};
use smallvec::SmallVec;

use super::{GeometryKey, MaterialKey};
use crate::renderer::core::DrawMode;
use crate::resources::Attribute;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

/// Per-instance attributes of an instanced mesh.
#[derive(Debug, Clone)]
pub struct InstanceData {
    pub count: u32,
    /// 16 floats per instance
    pub matrices: Attribute,
    /// 3 floats per instance
    pub colors: Option<Attribute>,
}

impl InstanceData {
    #[must_use]
    pub fn new(matrices: &[Mat4]) -> Self {
        let flat: Vec<f32> = matrices.iter().flat_map(Mat4::to_cols_array).collect();
        Self {
            count: matrices.len() as u32,
            matrices: Attribute::new(&flat, 16),
            colors: None,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colors: &[Vec3]) -> Self {
        let flat: Vec<f32> = colors.iter().flat_map(|c| c.to_array()).collect();
        self.colors = Some(Attribute::new(&flat, 3));
        self
    }
}

/// One material for the whole mesh, or one per geometry group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialSlot {
    Single(MaterialKey),
    Multi(SmallVec<[MaterialKey; 4]>),
}

impl From<MaterialKey> for MaterialSlot {
    fn from(key: MaterialKey) -> Self {
        Self::Single(key)
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    pub name: String,
    pub geometry: GeometryKey,
    pub material: MaterialSlot,
    pub world_matrix: Affine3A,
    pub draw_mode: DrawMode,
    /// Explicit sort priority inside a group
    pub render_order: i32,
    /// Sort priority of the enclosing group; items of lower groups draw first
    pub group_order: i32,
    pub visible: bool,
    pub instances: Option<InstanceData>,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: GeometryKey, material: impl Into<MaterialSlot>) -> Self {
        Self {
            id: MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed)),
            name: "Mesh".to_string(),
            geometry,
            material: material.into(),
            world_matrix: Affine3A::IDENTITY,
            draw_mode: DrawMode::Triangles,
            render_order: 0,
            group_order: 0,
            visible: true,
            instances: None,
        }
    }

    #[must_use]
    pub fn with_multi_material(geometry: GeometryKey, materials: &[MaterialKey]) -> Self {
        Self::new(geometry, MaterialSlot::Multi(materials.iter().copied().collect()))
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> MeshId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.world_matrix.translation = position.into();
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }

    #[must_use]
    pub fn with_instances(mut self, instances: InstanceData) -> Self {
        self.instances = Some(instances);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_instanced(&self) -> bool {
        self.instances.is_some()
    }
}
