//! Render lists
//!
//! [`RenderList`] collects the drawables of one scene render into three
//! buckets (opaque, transmissive, transparent) and orders them for submission.
//! Items live in a pool that survives across frames: [`RenderList::init`]
//! rewinds the cursor without freeing slots, pushes overwrite slots in place,
//! and [`RenderList::finish`] clears the references left in slots the current
//! frame did not reach.
//!
//! Sorting is stable, so items with equal keys keep their insertion order
//! from frame to frame.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::resources::{GeometryGroup, Material, MaterialId};
use crate::scene::{GeometryKey, MaterialKey, Mesh, MeshId, MeshKey, SceneId};

/// Pool slot describing one draw.
///
/// Reference fields are `None` in slots released by [`RenderList::finish`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderItem {
    pub id: Option<MeshId>,
    pub object: Option<MeshKey>,
    pub geometry: Option<GeometryKey>,
    pub material: Option<MaterialKey>,
    pub material_id: MaterialId,
    pub group_order: i32,
    pub render_order: i32,
    /// Projected depth; larger is farther
    pub z: f32,
    pub group: Option<GeometryGroup>,
}

impl RenderItem {
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.object.is_none()
    }

    fn release(&mut self) {
        self.id = None;
        self.object = None;
        self.geometry = None;
        self.material = None;
        self.group = None;
    }
}

/// Everything [`RenderList::push`] needs to describe one draw.
#[derive(Debug, Clone, Copy)]
pub struct Drawable<'a> {
    pub key: MeshKey,
    pub mesh: &'a Mesh,
    pub geometry: GeometryKey,
    pub material_key: MaterialKey,
    pub material: &'a Material,
    pub group_order: i32,
    pub z: f32,
    pub group: Option<GeometryGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Opaque,
    Transmissive,
    Transparent,
}

impl Bucket {
    /// Transmission wins over transparency.
    #[must_use]
    pub fn classify(material: &Material) -> Self {
        if material.transmission > 0.0 {
            Self::Transmissive
        } else if material.transparent {
            Self::Transparent
        } else {
            Self::Opaque
        }
    }
}

pub type RenderItemCompare<'a> = &'a dyn Fn(&RenderItem, &RenderItem) -> Ordering;

/// Front-to-back order for opaque and transmissive items.
#[must_use]
pub fn painter_sort_stable(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.group_order
        .cmp(&b.group_order)
        .then(a.render_order.cmp(&b.render_order))
        .then(a.material_id.cmp(&b.material_id))
        .then(a.z.total_cmp(&b.z))
        .then(a.id.cmp(&b.id))
}

/// Back-to-front order for transparent items.
#[must_use]
pub fn reverse_painter_sort_stable(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.group_order
        .cmp(&b.group_order)
        .then(a.render_order.cmp(&b.render_order))
        .then(b.z.total_cmp(&a.z))
        .then(a.id.cmp(&b.id))
}

#[derive(Debug, Default)]
pub struct RenderList {
    items: Vec<RenderItem>,
    cursor: usize,
    opaque: Vec<usize>,
    transmissive: Vec<usize>,
    transparent: Vec<usize>,
}

impl RenderList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a frame: empties the buckets and rewinds the pool cursor.
    pub fn init(&mut self) {
        self.cursor = 0;
        self.opaque.clear();
        self.transmissive.clear();
        self.transparent.clear();
    }

    fn next_item(&mut self, drawable: &Drawable<'_>) -> usize {
        let item = RenderItem {
            id: Some(drawable.mesh.id()),
            object: Some(drawable.key),
            geometry: Some(drawable.geometry),
            material: Some(drawable.material_key),
            material_id: drawable.material.id(),
            group_order: drawable.group_order,
            render_order: drawable.mesh.render_order,
            z: drawable.z,
            group: drawable.group,
        };
        let index = self.cursor;
        if let Some(slot) = self.items.get_mut(index) {
            *slot = item;
        } else {
            self.items.push(item);
        }
        self.cursor += 1;
        index
    }

    fn bucket_mut(&mut self, material: &Material) -> &mut Vec<usize> {
        match Bucket::classify(material) {
            Bucket::Opaque => &mut self.opaque,
            Bucket::Transmissive => &mut self.transmissive,
            Bucket::Transparent => &mut self.transparent,
        }
    }

    /// Appends a draw to its bucket.
    pub fn push(&mut self, drawable: &Drawable<'_>) {
        let index = self.next_item(drawable);
        self.bucket_mut(drawable.material).push(index);
    }

    /// Prepends a draw to its bucket. A later [`RenderList::sort`] reorders it
    /// like any other item.
    pub fn unshift(&mut self, drawable: &Drawable<'_>) {
        let index = self.next_item(drawable);
        self.bucket_mut(drawable.material).insert(0, index);
    }

    /// Stable sort of all three buckets. Transmissive items use the opaque
    /// comparator.
    pub fn sort(
        &mut self,
        custom_opaque: Option<RenderItemCompare<'_>>,
        custom_transparent: Option<RenderItemCompare<'_>>,
    ) {
        let items = &self.items;
        let opaque = custom_opaque.unwrap_or(&painter_sort_stable);
        let transparent = custom_transparent.unwrap_or(&reverse_painter_sort_stable);

        if self.opaque.len() > 1 {
            self.opaque.sort_by(|&a, &b| opaque(&items[a], &items[b]));
        }
        if self.transmissive.len() > 1 {
            self.transmissive.sort_by(|&a, &b| opaque(&items[a], &items[b]));
        }
        if self.transparent.len() > 1 {
            self.transparent
                .sort_by(|&a, &b| transparent(&items[a], &items[b]));
        }
    }

    /// Releases references held by pool slots beyond the cursor.
    ///
    /// Released slots form a contiguous tail, so the walk stops at the first
    /// slot that is already released.
    pub fn finish(&mut self) {
        for item in self.items.iter_mut().skip(self.cursor) {
            if item.is_released() {
                break;
            }
            item.release();
        }
    }

    pub fn opaque(&self) -> impl ExactSizeIterator<Item = &RenderItem> + '_ {
        self.opaque.iter().map(|&i| &self.items[i])
    }

    pub fn transmissive(&self) -> impl ExactSizeIterator<Item = &RenderItem> + '_ {
        self.transmissive.iter().map(|&i| &self.items[i])
    }

    pub fn transparent(&self) -> impl ExactSizeIterator<Item = &RenderItem> + '_ {
        self.transparent.iter().map(|&i| &self.items[i])
    }

    pub fn bucket(&self, bucket: Bucket) -> impl ExactSizeIterator<Item = &RenderItem> + '_ {
        let indices = match bucket {
            Bucket::Opaque => &self.opaque,
            Bucket::Transmissive => &self.transmissive,
            Bucket::Transparent => &self.transparent,
        };
        indices.iter().map(|&i| &self.items[i])
    }

    /// All pool slots, including released ones.
    #[must_use]
    pub fn pool(&self) -> &[RenderItem] {
        &self.items
    }

    /// Items pushed this frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }
}

/// Render lists keyed by scene and nesting depth of the render call.
#[derive(Debug, Default)]
pub struct RenderLists {
    lists: FxHashMap<SceneId, Vec<RenderList>>,
}

impl RenderLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The list for `scene` at `render_call_depth`, created on demand.
    pub fn get(&mut self, scene: SceneId, render_call_depth: usize) -> &mut RenderList {
        let lists = self.lists.entry(scene).or_default();
        if lists.len() <= render_call_depth {
            lists.resize_with(render_call_depth + 1, RenderList::new);
        }
        &mut lists[render_call_depth]
    }

    pub fn dispose(&mut self) {
        self.lists.clear();
    }
}
