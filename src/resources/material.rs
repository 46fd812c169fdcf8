use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec4;
use smallvec::SmallVec;

use super::plane::Plane;
use super::version_tracker::ChangeTracker;

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// Allocation-ordered material id. Render lists sort opaque items by it to
/// group draws that share a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Surface description for scene meshes.
///
/// Only the fields the render list and the clipping projector consume are
/// modelled; shading itself belongs to the backend.
#[derive(Debug)]
pub struct Material {
    id: MaterialId,
    pub name: String,
    /// Flat RGBA color; alpha is used for blending when `transparent`
    pub color: Vec4,
    pub visible: bool,
    pub transparent: bool,
    /// Non-zero routes the item to the transmissive bucket
    pub transmission: f32,
    pub wireframe: bool,
    pub clipping_planes: SmallVec<[Plane; 4]>,
    /// Clip only where all planes agree instead of where any plane does
    pub clip_intersection: bool,
    pub clip_shadows: bool,
    version: ChangeTracker,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Material")
    }
}

impl Material {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: MaterialId::next(),
            name: name.to_string(),
            color: Vec4::ONE,
            visible: true,
            transparent: false,
            transmission: 0.0,
            wireframe: false,
            clipping_planes: SmallVec::new(),
            clip_intersection: false,
            clip_shadows: false,
            version: ChangeTracker::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.version()
    }

    /// Marks the material as modified so cached per-material state is rebuilt.
    pub fn needs_update(&mut self) {
        self.version.changed();
    }

    // ========================================================================
    // Builder-style setters
    // ========================================================================

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    #[must_use]
    pub fn with_transmission(mut self, transmission: f32) -> Self {
        self.transmission = transmission;
        self
    }

    #[must_use]
    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub fn with_clipping_planes(mut self, planes: &[Plane]) -> Self {
        self.clipping_planes = planes.iter().copied().collect();
        self
    }

    #[must_use]
    pub fn with_clip_intersection(mut self, intersection: bool) -> Self {
        self.clip_intersection = intersection;
        self
    }

    #[must_use]
    pub fn with_clip_shadows(mut self, clip_shadows: bool) -> Self {
        self.clip_shadows = clip_shadows;
        self
    }
}
