//! GPU Resource Registry Tests
//!
//! Tests for:
//! - AttributeCache: version-checked uploads, partial ranges, growth, interleaving
//! - GeometryRegistry: wireframe derivation, disposal reports
//! - ObjectCache: once-per-frame geometry updates, instance buffers
//! - PropertyStore: auto-vivified side records
//! - HeadlessRenderer: draw accounting, instancing fallback, disposal

mod common;

use glam::{Mat4, Vec3};

use common::*;
use strata::renderer::RecordingDevice;
use strata::renderer::core::{
    AttributeCache, BufferRenderer, DisposeReport, DrawMode, GeometryRegistry, ObjectCache,
    PropertyStore, RenderInfo,
};
use strata::resources::{ElementType, Geometry, PolygonGeometry};
use strata::scene::InstanceData;
use strata::{Attribute, BufferGeometry, BufferRef, Material, Mesh, Renderer, RendererSettings, Scene};

const VERTEX: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX;

fn triangle_polygon() -> PolygonGeometry {
    PolygonGeometry::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![[0, 1, 2]],
    )
}

// ============================================================================
// AttributeCache
// ============================================================================

#[test]
fn unchanged_attribute_uploads_once() {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[0.0f32; 12], 3);

    let first = cache.update(&mut device, &attribute, VERTEX);
    let second = cache.update(&mut device, &attribute, VERTEX);

    assert_eq!(first, second);
    assert_eq!(device.stats().uploads(), 1);
    assert_eq!(device.stats().bytes_uploaded, 48);
    assert_eq!(cache.len(), 1);
}

#[test]
fn version_bump_rewrites_whole_buffer() {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[0.0f32; 12], 3);
    let created = cache.update(&mut device, &attribute, VERTEX);

    assert!(attribute.buffer().update(&[1.0f32; 12]));
    let updated = cache.update(&mut device, &attribute, VERTEX);

    assert_eq!(updated.buffer, created.buffer);
    assert_eq!(updated.version, attribute.version());
    let last = *device.uploads().last().unwrap();
    assert_eq!((last.offset, last.len), (0, 48));
    assert_eq!(device.stats().buffer_writes, 1);
}

#[test]
fn partial_update_writes_only_the_range() {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[0.0f32; 16], 4);
    cache.update(&mut device, &attribute, VERTEX);

    assert!(attribute.buffer().update_region(4, &[1.0f32, 2.0]));
    cache.update(&mut device, &attribute, VERTEX);

    let last = *device.uploads().last().unwrap();
    assert_eq!((last.offset, last.len), (16, 8));
    assert!(attribute.buffer().read().update_range().is_none());
}

#[test]
fn pending_range_is_ignored_on_first_upload() {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[0.0f32; 16], 4);
    attribute.buffer().update_region(2, &[5.0f32]);

    cache.update(&mut device, &attribute, VERTEX);

    assert_eq!(device.uploads()[0].len, 64);
    assert!(attribute.buffer().read().update_range().is_none());
}

#[test]
fn mistyped_partial_update_is_rejected() {
    let attribute = Attribute::new(&[0.0f32; 4], 1);
    let version = attribute.version();

    assert!(!attribute.buffer().update_region(0, &[1u16]));
    assert!(!attribute.buffer().update_region(3, &[1.0f32, 2.0]));
    assert_eq!(attribute.version(), version);
}

#[test]
fn mistyped_replacement_keeps_the_uploaded_data() -> anyhow::Result<()> {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[1.5f32, 2.5, 3.5, 4.5], 2);
    cache.update(&mut device, &attribute, VERTEX);
    let version = attribute.version();

    assert!(!attribute.buffer().update(&[7u16, 8, 9, 10]));
    let record = cache.update(&mut device, &attribute, VERTEX);

    assert_eq!(attribute.version(), version);
    assert_eq!(record.element_type, ElementType::Float);
    assert_eq!(attribute.buffer().float_at(0), Some(1.5));
    assert_eq!(attribute.buffer().vertex_count(), 2);
    anyhow::ensure!(device.stats().uploads() == 1, "mistyped data reached the device");
    Ok(())
}

#[test]
fn grown_data_recreates_the_buffer() {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[0.0f32; 12], 3);
    let created = cache.update(&mut device, &attribute, VERTEX);

    assert!(attribute.buffer().update(&[0.0f32; 24]));
    let grown = cache.update(&mut device, &attribute, VERTEX);

    assert_ne!(grown.buffer, created.buffer);
    assert_eq!(grown.size, 96);
    let stats = device.stats();
    assert_eq!((stats.buffers_created, stats.buffers_deleted), (2, 1));
    assert_eq!(device.buffer_size(grown.buffer), Some(96));
}

#[test]
fn interleaved_views_share_one_buffer() {
    let mut device = RecordingDevice::default();
    let mut info = RenderInfo::default();
    let mut registry = GeometryRegistry::new();
    let store = BufferRef::new(&[0.0f32; 24], 6, Some("interleaved"));
    let mut geometry = BufferGeometry::new();
    geometry.set_attribute("position", Attribute::interleaved(&store, 3, 0));
    geometry.set_attribute("normal", Attribute::interleaved(&store, 3, 3));
    let geometry = Geometry::from(geometry);

    let buffer_geometry = registry.get(&mut info, &geometry);
    registry.update(&mut device, buffer_geometry);

    assert_eq!(device.stats().buffers_created, 1);
    assert_eq!(registry.attributes().len(), 1);
    assert_eq!(buffer_geometry.position().unwrap().count(), 4);
}

#[test]
fn removing_twice_is_a_no_op() {
    let mut device = RecordingDevice::default();
    let mut cache = AttributeCache::new();
    let attribute = Attribute::new(&[0u16, 1, 2], 1);
    cache.update(&mut device, &attribute, wgpu::BufferUsages::INDEX);

    assert!(cache.remove(&mut device, &attribute));
    assert!(!cache.remove(&mut device, &attribute));
    assert_eq!(device.stats().buffers_deleted, 1);
    assert!(cache.is_empty());
}

// ============================================================================
// GeometryRegistry / ObjectCache
// ============================================================================

#[test]
fn geometry_updates_at_most_once_per_frame() {
    let mut device = RecordingDevice::default();
    let mut info = RenderInfo::default();
    let mut objects = ObjectCache::new();
    let mut scene = Scene::new();
    let key = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let material = scene.add_material(Material::default());
    let mesh = Mesh::new(key, material);
    let geometry = scene.geometry(key).unwrap();

    info.begin_frame();
    objects.update(&mut device, &mut info, &mesh, geometry);
    geometry
        .buffer_geometry()
        .position()
        .unwrap()
        .buffer()
        .update_region(0, &[9.0f32]);
    objects.update(&mut device, &mut info, &mesh, geometry);
    assert_eq!(device.stats().buffer_writes, 0);

    info.begin_frame();
    objects.update(&mut device, &mut info, &mesh, geometry);
    assert_eq!(device.stats().buffer_writes, 1);
    assert_eq!(info.memory.geometries, 1);
}

#[test]
fn wireframe_index_is_cached_until_the_source_changes() {
    let mut device = RecordingDevice::default();
    let mut registry = GeometryRegistry::new();
    let mut geometry = BufferGeometry::quad(1.0, 1.0);

    let first = registry.wireframe_attribute(&mut device, &geometry).unwrap().id();
    let again = registry.wireframe_attribute(&mut device, &geometry).unwrap().id();
    assert_eq!(first, again);

    assert!(geometry.index().unwrap().buffer().update(&[0u16, 2, 1, 0, 3, 2]));
    let bumped = registry.wireframe_attribute(&mut device, &geometry).unwrap().id();
    assert_ne!(bumped, first);

    geometry.set_indices(&[0, 1, 2]);
    let replaced = registry.wireframe_attribute(&mut device, &geometry).unwrap();
    assert_ne!(replaced.id(), bumped);
    assert_eq!(replaced.count(), 6);
}

#[test]
fn wireframe_without_vertices_is_absent() {
    let mut device = RecordingDevice::default();
    let mut registry = GeometryRegistry::new();

    assert!(registry.wireframe_attribute(&mut device, &BufferGeometry::new()).is_none());
}

#[test]
fn polygon_geometry_converts_once() {
    let mut info = RenderInfo::default();
    let mut registry = GeometryRegistry::new();
    let geometry = Geometry::from(triangle_polygon());

    let first = registry.get(&mut info, &geometry).id();
    let second = registry.get(&mut info, &geometry).id();

    assert_eq!(first, second);
    assert!(registry.is_registered(first));
    assert_eq!(info.memory.geometries, 1);
}

// ============================================================================
// PropertyStore
// ============================================================================

#[test]
fn property_records_are_created_on_demand() {
    let mut store = PropertyStore::new();
    let material = Material::default();

    assert!(store.peek(material.id()).is_none());
    store.get(material.id()).insert("program", 7u32);
    assert_eq!(store.peek(material.id()).unwrap().get::<u32>("program"), Some(&7));

    assert!(store.remove(material.id()));
    assert!(store.peek(material.id()).is_none());
    assert!(!store.remove(material.id()));
}

// ============================================================================
// HeadlessRenderer accounting
// ============================================================================

#[test]
fn shared_geometry_is_uploaded_once() {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    for name in ["a", "b"] {
        let material = scene.add_material(Material::new(name));
        scene.add_mesh(Mesh::new(geometry, material));
    }
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();
    let after_first = renderer.device().stats();
    renderer.render(&scene, &camera()).unwrap();

    // position + uv + index
    assert_eq!(after_first.buffers_created, 3);
    assert_eq!(renderer.device().stats().uploads(), after_first.uploads());
    assert_eq!(renderer.info().render.calls, 2);
    assert_eq!(renderer.info().render.triangles, 4);
}

#[test]
fn instanced_mesh_draws_once_per_call() {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let material = scene.add_material(Material::default());
    let instances = InstanceData::new(&[Mat4::IDENTITY, Mat4::from_translation(Vec3::X)]);
    scene.add_mesh(Mesh::new(geometry, material).with_instances(instances));
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();

    assert_eq!(renderer.draw_log()[0].instance_count, Some(2));
    assert_eq!(renderer.info().render.calls, 1);
    assert_eq!(renderer.info().render.triangles, 4);
    assert_eq!(renderer.device().draws()[0].instance_count, Some(2));
}

#[test]
fn instanced_draw_is_skipped_without_support() {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let material = scene.add_material(Material::default());
    let instances = InstanceData::new(&[Mat4::IDENTITY]);
    scene.add_mesh(Mesh::new(geometry, material).with_instances(instances));
    let mut renderer = renderer_with(RendererSettings {
        instancing_supported: false,
        ..Default::default()
    });

    renderer.render(&scene, &camera()).unwrap();

    assert!(renderer.draw_log().is_empty());
    assert_eq!(renderer.info().render.calls, 0);
    assert_eq!(renderer.device().stats().draws, 0);
}

#[test]
fn heavy_instanced_draw_is_counted_without_overflow() {
    let mut device = RecordingDevice::default();
    let mut info = RenderInfo::default();
    let draw = BufferRenderer::new(DrawMode::Triangles);

    assert!(draw.render_instances(&mut device, &mut info, 0, 500_000, 30_000));
    assert!(draw.render_instances(&mut device, &mut info, 0, 500_000, 30_000));

    assert_eq!(info.render.calls, 2);
    assert_eq!(info.render.triangles, 2 * 30_000 * 166_666);
    assert_eq!(device.draws()[1].instance_count, Some(30_000));
}

#[test]
fn wireframe_material_draws_line_list() -> anyhow::Result<()> {
    let mut scene = Scene::new();
    add_quad(&mut scene, 1.0, 1.0, Vec3::ZERO, Material::new("wire").with_wireframe(true));
    let mut renderer = renderer();

    renderer.render(&scene, &camera())?;

    let draw = renderer.device().draws()[0];
    assert_eq!(draw.mode, DrawMode::Lines);
    assert_eq!((draw.start, draw.count), (0, 12));
    assert!(renderer.draw_log()[0].wireframe);
    assert_eq!(renderer.info().render.lines, 6);
    assert!(renderer.screen().pixels().iter().all(|p| p.truncate() == Vec3::ZERO));
    Ok(())
}

#[test]
fn group_limits_the_drawn_range() {
    let mut scene = Scene::new();
    let mut geometry = BufferGeometry::quad(1.0, 1.0);
    geometry.add_group(3, 100, 0);
    let geometry = scene.add_geometry(geometry);
    let material = scene.add_material(Material::default());
    scene.add_mesh(Mesh::with_multi_material(geometry, &[material]));
    let mut renderer = renderer();

    renderer.render(&scene, &camera()).unwrap();

    let draw = renderer.device().draws()[0];
    assert_eq!((draw.start, draw.count), (3, 3));
}

// ============================================================================
// Disposal
// ============================================================================

#[test]
fn disposing_geometry_releases_everything_once() {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let solid = scene.add_material(Material::new("solid"));
    let wire = scene.add_material(Material::new("wire").with_wireframe(true));
    scene.add_mesh(Mesh::new(geometry, solid));
    scene.add_mesh(Mesh::new(geometry, wire));
    let mut renderer = renderer();
    renderer.render(&scene, &camera()).unwrap();
    assert_eq!(renderer.info().memory.geometries, 1);

    let geometry = scene.remove_geometry(geometry).unwrap();
    let report = renderer.dispose_geometry(&geometry);

    assert_eq!(
        report,
        DisposeReport {
            index: true,
            attributes: 2,
            wireframe: true,
            bindings: 2,
        }
    );
    assert_eq!(renderer.device().buffer_count(), 0);
    assert_eq!(renderer.device().vertex_array_count(), 0);
    assert_eq!(renderer.info().memory.geometries, 0);
    assert_eq!(renderer.dispose_geometry(&geometry), DisposeReport::default());
}

#[test]
fn unconverted_polygon_dispose_is_a_no_op() {
    let mut renderer = renderer();
    let geometry = Geometry::from(triangle_polygon());

    assert_eq!(renderer.dispose_geometry(&geometry), DisposeReport::default());
    let Geometry::Polygon(polygon) = &geometry else {
        unreachable!()
    };
    assert!(!polygon.is_converted());
}

#[test]
fn disposing_material_releases_its_bindings() {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let material = scene.add_material(Material::new("m"));
    scene.add_mesh(Mesh::new(geometry, material));
    let mut renderer = renderer();
    renderer.render(&scene, &camera()).unwrap();

    let material = scene.remove_material(material).unwrap();

    assert_eq!(renderer.dispose_material(&material), 1);
    assert_eq!(renderer.dispose_material(&material), 0);
    assert_eq!(renderer.device().vertex_array_count(), 0);
}

#[test]
fn disposing_instanced_mesh_releases_instance_buffers() {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let material = scene.add_material(Material::default());
    let instances = InstanceData::new(&[Mat4::IDENTITY]).with_colors(&[Vec3::ONE]);
    let key = scene.add_mesh(Mesh::new(geometry, material).with_instances(instances));
    let mut renderer = renderer();
    renderer.render(&scene, &camera()).unwrap();
    let before = renderer.device().buffer_count();

    let mesh = scene.remove_mesh(key).unwrap();

    assert!(renderer.dispose_mesh(&mesh));
    assert_eq!(renderer.device().buffer_count(), before - 2);
    assert!(!renderer.dispose_mesh(&mesh));
}

#[test]
fn renderer_dispose_releases_all_buffers() {
    let mut renderer = renderer();
    let scene = full_screen_scene(RED);
    renderer.render(&scene, &camera()).unwrap();
    assert!(renderer.device().buffer_count() > 0);

    renderer.dispose();

    assert_eq!(renderer.device().buffer_count(), 0);
    assert_eq!(renderer.device().vertex_array_count(), 0);
}
