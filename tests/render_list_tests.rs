//! Render List Tests
//!
//! Tests for:
//! - Bucketing: opaque / transmissive / transparent classification
//! - Sort rules: painter and reverse painter order, stability, custom comparators
//! - Pool reuse: init / push / finish across frames, tail release
//! - RenderLists: per scene and render-call depth
//! - Renderer integration: visibility, multi-material groups, unsorted submission

mod common;

use std::cmp::Ordering;

use glam::Vec3;

use common::*;
use strata::renderer::{
    Bucket, Drawable, RenderItem, RenderList, RenderLists, painter_sort_stable,
    reverse_painter_sort_stable,
};
use strata::resources::GeometryGroup;
use strata::scene::{MaterialKey, MeshKey};
use strata::{BufferGeometry, Material, Mesh, Renderer, RendererSettings, Scene};

/// Scene plus the keys needed to build drawables by hand.
struct Fixture {
    scene: Scene,
    meshes: Vec<MeshKey>,
    materials: Vec<MaterialKey>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            scene: Scene::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    fn add(&mut self, material: Material, render_order: i32) -> usize {
        let geometry = self.scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
        let material = self.scene.add_material(material);
        let mesh = self
            .scene
            .add_mesh(Mesh::new(geometry, material).with_render_order(render_order));
        self.meshes.push(mesh);
        self.materials.push(material);
        self.meshes.len() - 1
    }

    fn drawable(&self, i: usize, z: f32, group: Option<GeometryGroup>) -> Drawable<'_> {
        let key = self.meshes[i];
        let mesh = self.scene.mesh(key).unwrap();
        let material_key = self.materials[i];
        Drawable {
            key,
            mesh,
            geometry: mesh.geometry,
            material_key,
            material: self.scene.material(material_key).unwrap(),
            group_order: mesh.group_order,
            z,
            group,
        }
    }
}

fn zs<'a>(items: impl Iterator<Item = &'a RenderItem>) -> Vec<f32> {
    items.map(|item| item.z).collect()
}

fn group(start: u32) -> GeometryGroup {
    GeometryGroup {
        start,
        count: 3,
        material_index: 0,
    }
}

// ============================================================================
// Bucketing
// ============================================================================

#[test]
fn items_are_partitioned_by_material_kind() {
    let mut f = Fixture::new();
    let opaque = f.add(Material::new("opaque"), 0);
    let glass = f.add(Material::new("glass").with_transmission(0.5), 0);
    let veil = f.add(Material::new("veil").with_transparent(true), 0);
    let both = f.add(
        Material::new("both").with_transmission(1.0).with_transparent(true),
        0,
    );

    let mut list = RenderList::new();
    list.init();
    for i in [opaque, glass, veil, both] {
        list.push(&f.drawable(i, 0.0, None));
    }
    list.finish();

    assert_eq!(list.opaque().len(), 1);
    assert_eq!(list.transmissive().len(), 2);
    assert_eq!(list.transparent().len(), 1);
    assert_eq!(list.len(), 4);
    assert_eq!(list.bucket(Bucket::Transparent).len(), 1);
}

#[test]
fn classify_prefers_transmission() {
    let material = Material::new("m").with_transmission(0.1).with_transparent(true);
    assert_eq!(Bucket::classify(&material), Bucket::Transmissive);
    assert_eq!(Bucket::classify(&Material::new("plain")), Bucket::Opaque);
}

// ============================================================================
// Sorting
// ============================================================================

#[test]
fn transparent_items_sort_back_to_front() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("veil").with_transparent(true), 0);

    let mut list = RenderList::new();
    list.init();
    for z in [5.0, 1.0, 3.0] {
        list.push(&f.drawable(m, z, None));
    }
    list.finish();
    list.sort(None, None);

    assert_eq!(zs(list.transparent()), [5.0, 3.0, 1.0]);
}

#[test]
fn opaque_items_sort_front_to_back() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("solid"), 0);

    let mut list = RenderList::new();
    list.init();
    for z in [5.0, 1.0, 3.0] {
        list.push(&f.drawable(m, z, None));
    }
    list.sort(None, None);

    assert_eq!(zs(list.opaque()), [1.0, 3.0, 5.0]);
}

#[test]
fn render_order_outranks_depth() {
    let mut f = Fixture::new();
    let late = f.add(Material::new("late"), 2);
    let early = f.add(Material::new("early"), 1);

    let mut list = RenderList::new();
    list.init();
    list.push(&f.drawable(late, 0.1, None));
    list.push(&f.drawable(early, 9.0, None));
    list.sort(None, None);

    let orders: Vec<i32> = list.opaque().map(|item| item.render_order).collect();
    assert_eq!(orders, [1, 2]);
}

#[test]
fn group_order_outranks_render_order() {
    let mut f = Fixture::new();
    let a = f.add(Material::new("a"), -5);
    let b = f.add(Material::new("b"), 5);
    f.scene.mesh_mut(f.meshes[a]).unwrap().group_order = 1;

    let mut list = RenderList::new();
    list.init();
    list.push(&f.drawable(a, 0.0, None));
    list.push(&f.drawable(b, 0.0, None));
    list.sort(None, None);

    let groups: Vec<i32> = list.opaque().map(|item| item.group_order).collect();
    assert_eq!(groups, [0, 1]);
}

#[test]
fn opaque_items_group_by_material_before_depth() {
    let mut f = Fixture::new();
    let first = f.add(Material::new("first"), 0);
    let second = f.add(Material::new("second"), 0);

    let mut list = RenderList::new();
    list.init();
    list.push(&f.drawable(second, 0.0, None));
    list.push(&f.drawable(first, 9.0, None));
    list.sort(None, None);

    let ids: Vec<_> = list.opaque().map(|item| item.material_id).collect();
    assert!(ids[0] < ids[1]);
    assert_eq!(list.opaque().next().unwrap().z, 9.0);
}

#[test]
fn equal_keys_keep_insertion_order() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("solid"), 0);

    let mut list = RenderList::new();
    list.init();
    list.push(&f.drawable(m, 1.0, Some(group(0))));
    list.push(&f.drawable(m, 1.0, Some(group(6))));
    list.push(&f.drawable(m, 1.0, Some(group(3))));
    list.sort(None, None);

    let starts: Vec<u32> = list.opaque().map(|item| item.group.unwrap().start).collect();
    assert_eq!(starts, [0, 6, 3]);
}

#[test]
fn unshifted_item_is_reordered_by_sort() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("solid"), 0);

    let mut list = RenderList::new();
    list.init();
    list.push(&f.drawable(m, 1.0, None));
    list.unshift(&f.drawable(m, 4.0, None));
    assert_eq!(zs(list.opaque()), [4.0, 1.0]);

    list.sort(None, None);
    assert_eq!(zs(list.opaque()), [1.0, 4.0]);
}

#[test]
fn custom_comparators_replace_defaults() {
    let mut f = Fixture::new();
    let solid = f.add(Material::new("solid"), 0);
    let veil = f.add(Material::new("veil").with_transparent(true), 0);

    let mut list = RenderList::new();
    list.init();
    for z in [1.0, 3.0, 2.0] {
        list.push(&f.drawable(solid, z, None));
        list.push(&f.drawable(veil, z, None));
    }
    let descending = |a: &RenderItem, b: &RenderItem| b.z.total_cmp(&a.z);
    let ascending = |a: &RenderItem, b: &RenderItem| a.z.total_cmp(&b.z);
    list.sort(Some(&descending), Some(&ascending));

    assert_eq!(zs(list.opaque()), [3.0, 2.0, 1.0]);
    assert_eq!(zs(list.transparent()), [1.0, 2.0, 3.0]);
}

#[test]
fn comparators_fall_back_to_id() {
    let a = RenderItem {
        id: Some(Mesh::new(Default::default(), MaterialKey::default()).id()),
        ..Default::default()
    };
    let b = RenderItem {
        id: Some(Mesh::new(Default::default(), MaterialKey::default()).id()),
        ..Default::default()
    };

    assert_eq!(painter_sort_stable(&a, &b), Ordering::Less);
    assert_eq!(reverse_painter_sort_stable(&a, &b), Ordering::Less);
}

// ============================================================================
// Pool reuse
// ============================================================================

#[test]
fn finish_releases_only_the_unused_tail() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("solid"), 0);
    let mut list = RenderList::new();

    list.init();
    for z in 0..5 {
        list.push(&f.drawable(m, z as f32, None));
    }
    list.finish();
    assert_eq!(list.pool().len(), 5);
    assert!(list.pool().iter().all(|item| !item.is_released()));

    list.init();
    for z in [10.0, 11.0] {
        list.push(&f.drawable(m, z, None));
    }
    list.finish();
    assert_eq!(list.pool().len(), 5);
    assert_eq!(zs(list.pool()[..2].iter()), [10.0, 11.0]);
    assert!(list.pool()[2..].iter().all(RenderItem::is_released));

    list.init();
    list.push(&f.drawable(m, 20.0, None));
    list.finish();
    assert_eq!(list.len(), 1);
    assert_eq!(list.pool()[0].z, 20.0);
    assert!(!list.pool()[0].is_released());
    assert!(list.pool()[1..].iter().all(RenderItem::is_released));
}

#[test]
fn init_empties_buckets_but_keeps_pool() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("solid"), 0);
    let mut list = RenderList::new();
    list.init();
    list.push(&f.drawable(m, 1.0, None));
    list.push(&f.drawable(m, 2.0, None));

    list.init();

    assert!(list.is_empty());
    assert_eq!(list.opaque().len(), 0);
    assert_eq!(list.pool().len(), 2);
}

#[test]
fn render_lists_are_keyed_by_scene_and_depth() {
    let mut f = Fixture::new();
    let m = f.add(Material::new("solid"), 0);
    let other = Scene::new();
    let mut lists = RenderLists::new();

    lists.get(f.scene.id(), 0).push(&f.drawable(m, 1.0, None));
    lists.get(f.scene.id(), 1).push(&f.drawable(m, 2.0, None));

    assert_eq!(lists.get(f.scene.id(), 0).len(), 1);
    assert_eq!(lists.get(f.scene.id(), 1).len(), 1);
    assert!(lists.get(other.id(), 0).is_empty());

    lists.dispose();
    assert!(lists.get(f.scene.id(), 0).is_empty());
}

// ============================================================================
// Renderer integration
// ============================================================================

#[test]
fn renderer_draws_buckets_in_order() {
    let mut scene = Scene::new();
    let veil = add_quad(&mut scene, 1.0, 1.0, Vec3::ZERO, Material::new("veil").with_transparent(true));
    let glass = add_quad(&mut scene, 1.0, 1.0, Vec3::ZERO, Material::new("glass").with_transmission(1.0));
    let solid = add_quad(&mut scene, 1.0, 1.0, Vec3::ZERO, Material::new("solid"));
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();

    let order: Vec<MaterialKey> = renderer.draw_log().iter().map(|d| d.material).collect();
    assert_eq!(order, [solid, glass, veil]);
}

#[test]
fn invisible_meshes_and_materials_are_skipped() {
    let mut scene = Scene::new();
    add_quad(&mut scene, 1.0, 1.0, Vec3::ZERO, Material::new("hidden").with_visible(false));
    let shown = add_quad(&mut scene, 1.0, 1.0, Vec3::ZERO, Material::new("shown"));
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let mut mesh = Mesh::new(geometry, shown);
    mesh.visible = false;
    scene.add_mesh(mesh);
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();

    assert_eq!(renderer.draw_log().len(), 1);
    assert_eq!(renderer.draw_log()[0].material, shown);
}

#[test]
fn multi_material_mesh_draws_each_group() {
    let mut scene = Scene::new();
    let mut geometry = BufferGeometry::quad(1.0, 1.0);
    geometry.add_group(0, 3, 0);
    geometry.add_group(3, 3, 1);
    geometry.add_group(0, 6, 2);
    let geometry = scene.add_geometry(geometry);
    let first = scene.add_material(Material::new("first"));
    let second = scene.add_material(Material::new("second"));
    let hidden = scene.add_material(Material::new("hidden").with_visible(false));
    scene.add_mesh(Mesh::with_multi_material(geometry, &[first, second, hidden]));
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();

    let materials: Vec<MaterialKey> = renderer.draw_log().iter().map(|d| d.material).collect();
    assert_eq!(materials, [first, second]);
}

#[test]
fn unsorted_renderer_submits_in_scene_order() {
    let mut scene = Scene::new();
    let far = add_quad(&mut scene, 1.0, 1.0, Vec3::new(0.0, 0.0, -3.0), Material::new("far"));
    let near = add_quad(&mut scene, 1.0, 1.0, Vec3::new(0.0, 0.0, 3.0), Material::new("near"));

    let mut sorted = renderer();
    sorted.render(&scene, &camera()).unwrap();
    let mut unsorted = renderer_with(RendererSettings {
        sort_objects: false,
        ..Default::default()
    });
    unsorted.render(&scene, &camera()).unwrap();

    let order = |r: &strata::HeadlessRenderer| -> Vec<MaterialKey> {
        r.draw_log().iter().map(|d| d.material).collect()
    };
    // Materials differ, so the sorted order follows material ids.
    assert_eq!(order(&sorted), [far, near]);
    assert_eq!(order(&unsorted), [far, near]);
}

#[test]
fn installed_sort_function_is_used() {
    let mut scene = Scene::new();
    let material = scene.add_material(Material::new("shared"));
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let near = scene.add_mesh(Mesh::new(geometry, material).with_position(Vec3::new(0.0, 0.0, 3.0)));
    let far = scene.add_mesh(Mesh::new(geometry, material).with_position(Vec3::new(0.0, 0.0, -3.0)));
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();
    let objects: Vec<MeshKey> = renderer.draw_log().iter().map(|d| d.object).collect();
    assert_eq!(objects, [near, far]);

    renderer.clear_draw_log();
    renderer.set_opaque_sort(Some(Box::new(|a: &RenderItem, b: &RenderItem| b.z.total_cmp(&a.z))));
    renderer.render(&scene, &camera()).unwrap();
    let objects: Vec<MeshKey> = renderer.draw_log().iter().map(|d| d.object).collect();
    assert_eq!(objects, [far, near]);
}
