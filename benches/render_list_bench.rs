use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::Vec3;
use strata::renderer::{Drawable, RenderList};
use strata::scene::{MaterialKey, MeshKey};
use strata::{BufferGeometry, Material, Mesh, Scene};

struct Frame {
    scene: Scene,
    meshes: Vec<(MeshKey, MaterialKey)>,
}

/// `count` meshes over 8 materials, a quarter of them transparent.
fn build_frame(count: usize) -> Frame {
    let mut scene = Scene::new();
    let geometry = scene.add_geometry(BufferGeometry::quad(1.0, 1.0));
    let materials: Vec<MaterialKey> = (0..8)
        .map(|i| scene.add_material(Material::new("bench").with_transparent(i % 4 == 0)))
        .collect();

    let meshes = (0..count)
        .map(|i| {
            let material = materials[i % materials.len()];
            let z = ((i * 7919) % count) as f32;
            let mesh = Mesh::new(geometry, material).with_position(Vec3::new(0.0, 0.0, -z));
            (scene.add_mesh(mesh), material)
        })
        .collect();
    Frame { scene, meshes }
}

fn fill(list: &mut RenderList, frame: &Frame) {
    list.init();
    for (i, &(key, material_key)) in frame.meshes.iter().enumerate() {
        let Some(mesh) = frame.scene.mesh(key) else {
            continue;
        };
        let Some(material) = frame.scene.material(material_key) else {
            continue;
        };
        list.push(&Drawable {
            key,
            mesh,
            geometry: mesh.geometry,
            material_key,
            material,
            group_order: 0,
            z: ((i * 7919) % frame.meshes.len()) as f32,
            group: None,
        });
    }
    list.finish();
}

fn bench_render_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("RenderList");

    for count in [1_000, 10_000] {
        let frame = build_frame(count);
        let mut list = RenderList::new();
        fill(&mut list, &frame);

        group.bench_with_input(BenchmarkId::new("push + finish", count), &frame, |b, frame| {
            b.iter(|| {
                fill(&mut list, frame);
                black_box(list.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("push + sort", count), &frame, |b, frame| {
            b.iter(|| {
                fill(&mut list, frame);
                list.sort(None, None);
                black_box(list.opaque().next().map(|item| item.z));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_list);
criterion_main!(benches);
