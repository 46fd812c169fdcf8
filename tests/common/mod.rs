//! Shared fixtures for the integration tests.
//!
//! The standard fixture is an 8x8 headless renderer looking down -Z at the
//! origin through an orthographic camera whose view volume spans [-1, 1] in
//! X and Y. A 4x4 quad at the origin covers every pixel.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec3, Vec4};

use strata::errors::Result;
use strata::scene::{MaterialKey, shared_camera, shared_scene};
use strata::{
    BufferGeometry, Camera, HeadlessRenderer, Material, Mesh, Pass, PassContext, PassState,
    RendererSettings, Scene, SharedCamera, SharedScene,
};

pub const SIZE: u32 = 8;
pub const EPSILON: f32 = 1e-4;

pub const RED: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
pub const GREEN: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx_color(a: Vec4, b: Vec4) -> bool {
    (a - b).abs().max_element() < EPSILON
}

pub fn renderer() -> HeadlessRenderer {
    renderer_with(RendererSettings::default())
}

/// `settings` with the fixture size applied.
pub fn renderer_with(settings: RendererSettings) -> HeadlessRenderer {
    init_logger();
    HeadlessRenderer::new(RendererSettings {
        width: SIZE,
        height: SIZE,
        ..settings
    })
}

pub fn camera() -> Camera {
    let mut camera = Camera::new_orthographic(1.0, 1.0, 0.1, 10.0);
    camera.look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    camera
}

pub fn shared_fixture_camera() -> SharedCamera {
    shared_camera(camera())
}

/// Adds a `width` x `height` quad centered at `position`.
pub fn add_quad(scene: &mut Scene, width: f32, height: f32, position: Vec3, material: Material) -> MaterialKey {
    let geometry = scene.add_geometry(BufferGeometry::quad(width, height));
    let material = scene.add_material(material);
    scene.add_mesh(Mesh::new(geometry, material).with_position(position));
    material
}

/// A scene whose single quad fills the view with `color`.
pub fn full_screen_scene(color: Vec4) -> Scene {
    let mut scene = Scene::new();
    add_quad(
        &mut scene,
        4.0,
        4.0,
        Vec3::ZERO,
        Material::new("fill").with_color(color),
    );
    scene
}

pub fn shared_full_screen_scene(color: Vec4) -> SharedScene {
    shared_scene(full_screen_scene(color))
}

/// A scene whose quad covers the left half of the view.
pub fn left_half_scene() -> SharedScene {
    let mut scene = Scene::new();
    add_quad(
        &mut scene,
        2.0,
        4.0,
        Vec3::new(-1.0, 0.0, 0.0),
        Material::new("mask"),
    );
    shared_scene(scene)
}

// ============================================================================
// SpyPass
// ============================================================================

/// What a [`SpyPass`] saw during one render.
#[derive(Debug, Clone, PartialEq)]
pub struct SpyCall {
    pub name: String,
    pub render_to_screen: bool,
    pub mask_active: bool,
    pub delta_time: f32,
}

pub type SpyLog = Rc<RefCell<Vec<SpyCall>>>;

/// Records every render and resize into shared logs.
pub struct SpyPass {
    pub name: String,
    pub state: PassState,
    pub calls: SpyLog,
    pub sizes: Rc<RefCell<Vec<(u32, u32)>>>,
}

impl SpyPass {
    pub fn new(name: &str, calls: &SpyLog) -> Self {
        Self {
            name: name.to_string(),
            state: PassState::default(),
            calls: Rc::clone(calls),
            sizes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.state.enabled = false;
        self
    }

    pub fn without_swap(mut self) -> Self {
        self.state.needs_swap = false;
        self
    }
}

impl Pass for SpyPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.sizes.borrow_mut().push((width, height));
    }

    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        self.calls.borrow_mut().push(SpyCall {
            name: self.name.clone(),
            render_to_screen: self.state.render_to_screen,
            mask_active: ctx.mask_active,
            delta_time: ctx.delta_time,
        });
        Ok(())
    }
}

/// A pass that relies on the default `render`.
pub struct UnimplementedPass {
    pub state: PassState,
}

impl Pass for UnimplementedPass {
    fn name(&self) -> &str {
        "UnimplementedPass"
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }
}
