use glam::Vec3;

use crate::errors::{Result, StrataError};
use crate::renderer::backend::Renderer;
use crate::renderer::graph::pass::{Pass, PassContext, PassState};
use crate::resources::RenderTarget;
use crate::scene::{Camera, MaterialKey, Scene, SharedCamera, SharedScene};

/// Renders a scene into the read buffer (or the screen).
///
/// The renderer's auto-clear flag, clear color and alpha, and the scene's
/// override material are adjusted for the draw and restored afterwards,
/// whether or not the draw succeeded.
pub struct RenderPass {
    state: PassState,
    pub scene: SharedScene,
    pub camera: SharedCamera,
    /// Material of `scene` that replaces every mesh material
    pub override_material: Option<MaterialKey>,
    pub clear_color: Option<Vec3>,
    pub clear_alpha: Option<f32>,
    /// Clear depth after binding the target
    pub clear_depth: bool,
}

impl RenderPass {
    #[must_use]
    pub fn new(scene: SharedScene, camera: SharedCamera) -> Self {
        Self {
            state: PassState {
                clear: true,
                needs_swap: false,
                ..Default::default()
            },
            scene,
            camera,
            override_material: None,
            clear_color: None,
            clear_alpha: None,
            clear_depth: false,
        }
    }

    #[must_use]
    pub fn with_override_material(mut self, material: MaterialKey) -> Self {
        self.override_material = Some(material);
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, color: Vec3) -> Self {
        self.clear_color = Some(color);
        self
    }

    #[must_use]
    pub fn with_clear_alpha(mut self, alpha: f32) -> Self {
        self.clear_alpha = Some(alpha);
        self
    }

    #[must_use]
    pub fn with_clear_depth(mut self, clear_depth: bool) -> Self {
        self.clear_depth = clear_depth;
        self
    }

    fn draw(
        &self,
        renderer: &mut dyn Renderer,
        read_buffer: &RenderTarget,
        scene: &Scene,
        camera: &Camera,
    ) -> Result<()> {
        if let Some(color) = self.clear_color {
            let alpha = renderer.clear_alpha();
            renderer.set_clear_color(color, alpha);
        }
        if let Some(alpha) = self.clear_alpha {
            renderer.set_clear_alpha(alpha);
        }

        let target = (!self.state.render_to_screen).then_some(read_buffer);
        renderer.set_render_target(target);
        if self.clear_depth {
            renderer.clear_depth()?;
        }
        if self.state.clear {
            let flags = renderer.auto_clear_flags();
            renderer.clear(flags)?;
        }
        renderer.render(scene, camera)
    }
}

impl Pass for RenderPass {
    fn name(&self) -> &str {
        "RenderPass"
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let mut scene = self.scene.try_write().ok_or_else(|| StrataError::SceneLocked {
            pass: self.name().to_string(),
            resource: "scene",
        })?;
        let camera = self.camera.try_read().ok_or_else(|| StrataError::SceneLocked {
            pass: self.name().to_string(),
            resource: "camera",
        })?;

        let renderer = &mut *ctx.renderer;
        let old_auto_clear = renderer.auto_clear();
        let old_clear_color = renderer.clear_color();
        let old_clear_alpha = renderer.clear_alpha();
        let old_override = scene.override_material;

        renderer.set_auto_clear(false);
        if self.override_material.is_some() {
            scene.override_material = self.override_material;
        }

        let result = self.draw(renderer, ctx.read_buffer, &scene, &camera);

        renderer.set_clear_color(old_clear_color, old_clear_alpha);
        scene.override_material = old_override;
        renderer.set_auto_clear(old_auto_clear);
        result
    }
}
