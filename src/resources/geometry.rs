use std::ops::Range;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Vec2, Vec3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::attribute::Attribute;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        Self(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A draw sub-range bound to one entry of a multi-material list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: usize,
}

// ============================================================================
// BufferGeometry
// ============================================================================

/// GPU-ready geometry: named attributes, an optional index and draw groups.
///
/// Deliberately not `Clone`: its id is the key of every GPU cache entry.
#[derive(Debug)]
pub struct BufferGeometry {
    id: GeometryId,
    pub label: String,
    index: Option<Attribute>,
    attributes: FxHashMap<String, Attribute>,
    morph_attributes: FxHashMap<String, SmallVec<[Attribute; 4]>>,
    groups: Vec<GeometryGroup>,
    pub draw_range: Range<u32>,
}

impl Default for BufferGeometry {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferGeometry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: GeometryId::next(),
            label: String::new(),
            index: None,
            attributes: FxHashMap::default(),
            morph_attributes: FxHashMap::default(),
            groups: Vec::new(),
            draw_range: 0..u32::MAX,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> GeometryId {
        self.id
    }

    #[must_use]
    pub fn index(&self) -> Option<&Attribute> {
        self.index.as_ref()
    }

    pub fn set_index(&mut self, index: Option<Attribute>) {
        self.index = index;
    }

    pub fn set_indices(&mut self, indices: &[u16]) {
        self.index = Some(Attribute::new(indices, 1));
    }

    pub fn set_indices_u32(&mut self, indices: &[u32]) {
        self.index = Some(Attribute::new(indices, 1));
    }

    pub fn set_attribute(&mut self, name: &str, attribute: Attribute) {
        self.attributes.insert(name.to_string(), attribute);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn position(&self) -> Option<&Attribute> {
        self.attributes.get("position")
    }

    pub fn add_morph_attribute(&mut self, name: &str, attribute: Attribute) {
        self.morph_attributes
            .entry(name.to_string())
            .or_default()
            .push(attribute);
    }

    pub fn morph_attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.morph_attributes.values().flatten()
    }

    pub fn add_group(&mut self, start: u32, count: u32, material_index: usize) {
        self.groups.push(GeometryGroup {
            start,
            count,
            material_index,
        });
    }

    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    #[must_use]
    pub fn groups(&self) -> &[GeometryGroup] {
        &self.groups
    }

    /// Elements drawn when the whole geometry is rendered.
    #[must_use]
    pub fn element_count(&self) -> u32 {
        match (&self.index, self.position()) {
            (Some(index), _) => index.count() as u32,
            (None, Some(position)) => position.count() as u32,
            (None, None) => 0,
        }
    }

    /// An axis-aligned `width` x `height` quad in the XY plane, two triangles.
    #[must_use]
    pub fn quad(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let mut geometry = Self::new();
        geometry.set_attribute(
            "position",
            Attribute::new(
                &[-hw, -hh, 0.0, hw, -hh, 0.0, hw, hh, 0.0, -hw, hh, 0.0],
                3,
            ),
        );
        geometry.set_attribute(
            "uv",
            Attribute::new(&[0.0f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 2),
        );
        geometry.set_indices(&[0, 1, 2, 0, 2, 3]);
        geometry
    }
}

// ============================================================================
// PolygonGeometry
// ============================================================================

/// Face-list geometry that is converted to a [`BufferGeometry`] on first use.
///
/// The converted geometry is cached; later calls return the same instance, so
/// GPU caches keyed on its id stay valid.
#[derive(Debug, Default)]
pub struct PolygonGeometry {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub uvs: Option<Vec<Vec2>>,
    converted: OnceLock<BufferGeometry>,
}

impl PolygonGeometry {
    #[must_use]
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            uvs: None,
            converted: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    #[must_use]
    pub fn is_converted(&self) -> bool {
        self.converted.get().is_some()
    }

    pub fn to_buffer_geometry(&self) -> &BufferGeometry {
        self.converted.get_or_init(|| {
            let mut geometry = BufferGeometry::new();
            let positions: Vec<f32> = self.vertices.iter().flat_map(|v| v.to_array()).collect();
            geometry.set_attribute("position", Attribute::new(&positions, 3));
            if let Some(uvs) = &self.uvs {
                let flat: Vec<f32> = uvs.iter().flat_map(|uv| uv.to_array()).collect();
                geometry.set_attribute("uv", Attribute::new(&flat, 2));
            }
            let indices: Vec<u32> = self.faces.iter().flatten().copied().collect();
            if indices.iter().any(|&i| i >= 65_535) {
                geometry.set_indices_u32(&indices);
            } else {
                let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
                geometry.set_indices(&narrow);
            }
            geometry
        })
    }
}

/// Either form of geometry a mesh may reference.
#[derive(Debug)]
pub enum Geometry {
    Buffer(BufferGeometry),
    Polygon(PolygonGeometry),
}

impl Geometry {
    /// The buffer form, converting on first access for polygon geometry.
    #[must_use]
    pub fn buffer_geometry(&self) -> &BufferGeometry {
        match self {
            Self::Buffer(geometry) => geometry,
            Self::Polygon(polygon) => polygon.to_buffer_geometry(),
        }
    }
}

impl From<BufferGeometry> for Geometry {
    fn from(geometry: BufferGeometry) -> Self {
        Self::Buffer(geometry)
    }
}

impl From<PolygonGeometry> for Geometry {
    fn from(geometry: PolygonGeometry) -> Self {
        Self::Polygon(geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_conversion_is_cached() {
        let polygon = PolygonGeometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        );
        assert!(!polygon.is_converted());
        let first = polygon.to_buffer_geometry().id();
        let second = polygon.to_buffer_geometry().id();
        assert_eq!(first, second);
        assert!(polygon.is_converted());
        assert_eq!(polygon.to_buffer_geometry().element_count(), 3);
    }

    #[test]
    fn quad_has_six_indices() {
        let quad = BufferGeometry::quad(2.0, 2.0);
        assert_eq!(quad.element_count(), 6);
        assert_eq!(quad.position().map(Attribute::count), Some(4));
    }
}
