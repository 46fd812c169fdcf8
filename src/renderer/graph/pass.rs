//! Pass contract
//!
//! A [`Pass`] is one stage of an [`EffectComposer`](super::EffectComposer)
//! sequence. Every pass embeds a [`PassState`] carrying the flags the composer
//! reads (`enabled`, `needs_swap`) and writes (`render_to_screen`), and
//! receives everything else it touches through a [`PassContext`]. Passes never
//! reach back into the composer that owns them.
//!
//! # Buffer contract
//!
//! Each pass is handed both ping-pong targets and picks which one to touch:
//!
//! | Pass          | Reads        | Writes                          | Swap |
//! |---------------|--------------|---------------------------------|------|
//! | `ClearPass`   | -            | read buffer (or screen)         | no   |
//! | `RenderPass`  | -            | read buffer (or screen)         | no   |
//! | `MaskPass`    | -            | stencil of both buffers         | no   |
//! | `ShaderPass`  | read buffer  | write buffer (or screen)        | yes  |

use crate::errors::{Result, StrataError};
use crate::renderer::backend::Renderer;
use crate::resources::{RenderTarget, ShaderMaterial};

/// Flags shared by every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassState {
    /// Participates in the composer sequence
    pub enabled: bool,
    /// Output replaces the readable buffer
    pub needs_swap: bool,
    /// Clears the target before drawing
    pub clear: bool,
    /// Set by the composer before each render
    pub render_to_screen: bool,
}

impl Default for PassState {
    fn default() -> Self {
        Self {
            enabled: true,
            needs_swap: true,
            clear: false,
            render_to_screen: false,
        }
    }
}

/// How a pass affects the composer's stencil-mask toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MaskRole {
    #[default]
    None,
    /// Activates the mask after rendering
    Begin,
    /// Deactivates the mask after rendering
    End,
}

/// Everything a pass may touch during [`Pass::render`].
pub struct PassContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub write_buffer: &'a RenderTarget,
    pub read_buffer: &'a RenderTarget,
    /// Seconds since the previous composer render
    pub delta_time: f32,
    /// A `MaskPass` ran earlier in this sequence without a matching clear
    pub mask_active: bool,
}

pub trait Pass {
    fn name(&self) -> &str;

    fn state(&self) -> &PassState;

    fn state_mut(&mut self) -> &mut PassState;

    fn mask_role(&self) -> MaskRole {
        MaskRole::None
    }

    /// Receives the composer's effective size (pixel ratio applied).
    fn set_size(&mut self, _width: u32, _height: u32) {}

    /// Draws the pass. Concrete passes must override this; the default
    /// reports [`StrataError::PassNotImplemented`].
    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let _ = ctx;
        log::error!("{}: render() must be implemented in derived pass", self.name());
        Err(StrataError::PassNotImplemented {
            pass: self.name().to_string(),
        })
    }

    /// Releases resources the pass created on the renderer.
    fn dispose(&mut self, _renderer: &mut dyn Renderer) {}

    #[inline]
    fn enabled(&self) -> bool {
        self.state().enabled
    }

    #[inline]
    fn needs_swap(&self) -> bool {
        self.state().needs_swap
    }
}

/// A fullscreen triangle pair drawn with one [`ShaderMaterial`].
#[derive(Debug)]
pub struct FullScreenQuad {
    material: ShaderMaterial,
}

impl FullScreenQuad {
    #[must_use]
    pub fn new(material: ShaderMaterial) -> Self {
        Self { material }
    }

    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<()> {
        renderer.render_fullscreen(&self.material)
    }

    #[must_use]
    pub fn material(&self) -> &ShaderMaterial {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut ShaderMaterial {
        &mut self.material
    }
}
