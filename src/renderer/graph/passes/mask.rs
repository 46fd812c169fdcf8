use wgpu::{CompareFunction, StencilOperation};

use crate::errors::{Result, StrataError};
use crate::renderer::backend::ClearFlags;
use crate::renderer::graph::pass::{MaskRole, Pass, PassContext, PassState};
use crate::scene::{SharedCamera, SharedScene};

/// Writes a stencil mask from the silhouette of `scene`.
///
/// The scene is drawn into both ping-pong buffers with color and depth writes
/// locked off, stamping 1 (or 0 when `inverse`) wherever it covers. The
/// stencil test is then left configured so later passes only draw where the
/// stencil equals 1, until a [`ClearMaskPass`] runs.
pub struct MaskPass {
    state: PassState,
    pub scene: SharedScene,
    pub camera: SharedCamera,
    /// Mask everything except the silhouette
    pub inverse: bool,
}

impl MaskPass {
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
            inverse: false,
        }
    }

    #[must_use]
    pub fn inverted(mut self) -> Self {
        self.inverse = true;
        self
    }
}

impl Pass for MaskPass {
    fn name(&self) -> &str {
        "MaskPass"
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn mask_role(&self) -> MaskRole {
        MaskRole::Begin
    }

    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let scene = self.scene.try_read().ok_or_else(|| StrataError::SceneLocked {
            pass: self.name().to_string(),
            resource: "scene",
        })?;
        let camera = self.camera.try_read().ok_or_else(|| StrataError::SceneLocked {
            pass: self.name().to_string(),
            resource: "camera",
        })?;
        let renderer = &mut *ctx.renderer;

        let (write_value, clear_value) = if self.inverse { (0, 1) } else { (1, 0) };
        {
            let state = renderer.state_mut();
            state.color.set_mask(false);
            state.depth.set_mask(false);
            state.color.set_locked(true);
            state.depth.set_locked(true);

            let stencil = &mut state.stencil;
            stencil.set_test(true);
            stencil.set_op(
                StencilOperation::Replace,
                StencilOperation::Replace,
                StencilOperation::Replace,
            );
            stencil.set_func(CompareFunction::Always, write_value, 0xffff_ffff);
            stencil.set_clear(clear_value);
            stencil.set_locked(true);
        }

        let mut result = Ok(());
        for target in [ctx.read_buffer, ctx.write_buffer] {
            renderer.set_render_target(Some(target));
            if self.state.clear {
                result = renderer.clear(ClearFlags::all());
            }
            if result.is_ok() {
                result = renderer.render(&scene, &camera);
            }
            if result.is_err() {
                break;
            }
        }

        let state = renderer.state_mut();
        state.color.set_locked(false);
        state.depth.set_locked(false);
        state.color.set_mask(true);
        state.depth.set_mask(true);

        let stencil = &mut state.stencil;
        stencil.set_locked(false);
        stencil.set_func(CompareFunction::Equal, 1, 0xffff_ffff);
        stencil.set_op(
            StencilOperation::Keep,
            StencilOperation::Keep,
            StencilOperation::Keep,
        );
        stencil.set_locked(true);
        result
    }
}

/// Ends the region opened by a [`MaskPass`].
#[derive(Debug, Clone)]
pub struct ClearMaskPass {
    state: PassState,
}

impl Default for ClearMaskPass {
    fn default() -> Self {
        Self::new()
    }
}

impl ClearMaskPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: PassState {
                needs_swap: false,
                ..Default::default()
            },
        }
    }
}

impl Pass for ClearMaskPass {
    fn name(&self) -> &str {
        "ClearMaskPass"
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn mask_role(&self) -> MaskRole {
        MaskRole::End
    }

    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let stencil = &mut ctx.renderer.state_mut().stencil;
        stencil.set_locked(false);
        stencil.set_test(false);
        Ok(())
    }
}
