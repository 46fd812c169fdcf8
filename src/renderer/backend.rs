//! Composer-facing renderer surface
//!
//! The post-processing graph drives a renderer only through [`Renderer`]:
//! target binding, clears, clear-color bookkeeping, scene and fullscreen
//! draws, and the fixed-function [`DrawState`] used for stencil masking.

use bitflags::bitflags;
use glam::Vec3;

use super::state::DrawState;
use crate::errors::Result;
use crate::resources::{RenderTarget, ShaderMaterial};
use crate::scene::{Camera, Scene};

bitflags! {
    /// Buffers affected by a clear.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

impl Default for ClearFlags {
    fn default() -> Self {
        Self::all()
    }
}

pub trait Renderer {
    /// Drawing-buffer size in CSS pixels (before the pixel ratio).
    fn size(&self) -> (u32, u32);

    fn pixel_ratio(&self) -> f32;

    /// Currently bound target; `None` is the screen.
    fn render_target(&self) -> Option<&RenderTarget>;

    fn set_render_target(&mut self, target: Option<&RenderTarget>);

    /// Clears the selected buffers of the bound target, honouring the write
    /// masks in [`DrawState`].
    fn clear(&mut self, flags: ClearFlags) -> Result<()>;

    fn clear_depth(&mut self) -> Result<()> {
        self.clear(ClearFlags::DEPTH)
    }

    fn clear_color(&self) -> Vec3;

    fn clear_alpha(&self) -> f32;

    fn set_clear_color(&mut self, color: Vec3, alpha: f32);

    fn set_clear_alpha(&mut self, alpha: f32);

    /// Whether `render` clears the target before drawing.
    fn auto_clear(&self) -> bool;

    fn set_auto_clear(&mut self, auto_clear: bool);

    /// Buffers cleared by an automatic clear.
    fn auto_clear_flags(&self) -> ClearFlags;

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()>;

    /// Draws a fullscreen triangle pair with `material` into the bound target.
    fn render_fullscreen(&mut self, material: &ShaderMaterial) -> Result<()>;

    fn state(&self) -> &DrawState;

    fn state_mut(&mut self) -> &mut DrawState;

    /// Releases the storage of a target. Rebinding it reallocates.
    fn dispose_render_target(&mut self, target: &RenderTarget);
}
