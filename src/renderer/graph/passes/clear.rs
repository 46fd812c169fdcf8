use glam::Vec3;

use crate::errors::Result;
use crate::renderer::backend::ClearFlags;
use crate::renderer::graph::pass::{Pass, PassContext, PassState};

/// Clears the read buffer (or the screen) to a fixed color.
#[derive(Debug, Clone)]
pub struct ClearPass {
    state: PassState,
    /// `None` clears with whatever color the renderer holds
    pub clear_color: Option<Vec3>,
    pub clear_alpha: f32,
}

impl Default for ClearPass {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0)
    }
}

impl ClearPass {
    #[must_use]
    pub fn new(clear_color: Vec3, clear_alpha: f32) -> Self {
        Self {
            state: PassState {
                needs_swap: false,
                ..Default::default()
            },
            clear_color: Some(clear_color),
            clear_alpha,
        }
    }

    /// Clears with the renderer's current clear color.
    #[must_use]
    pub fn with_renderer_color() -> Self {
        Self {
            clear_color: None,
            ..Self::default()
        }
    }
}

impl Pass for ClearPass {
    fn name(&self) -> &str {
        "ClearPass"
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let renderer = &mut *ctx.renderer;
        let previous = self.clear_color.map(|color| {
            let saved = (renderer.clear_color(), renderer.clear_alpha());
            renderer.set_clear_color(color, self.clear_alpha);
            saved
        });

        let target = (!self.state.render_to_screen).then_some(ctx.read_buffer);
        renderer.set_render_target(target);
        let result = renderer.clear(ClearFlags::all());

        if let Some((color, alpha)) = previous {
            renderer.set_clear_color(color, alpha);
        }
        result
    }
}
