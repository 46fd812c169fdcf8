//! Composer & Renderer Settings
//!
//! Plain configuration structs with sensible defaults.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use strata::settings::{ComposerSettings, RendererSettings};
//!
//! // Stencil-capable ping-pong targets for masked effects
//! let composer_settings = ComposerSettings {
//!     stencil_buffer: true,
//!     ..Default::default()
//! };
//!
//! // A 1280x720 headless renderer with per-material clipping
//! let renderer_settings = RendererSettings {
//!     width: 1280,
//!     height: 720,
//!     local_clipping_enabled: true,
//!     ..Default::default()
//! };
//! ```

use glam::Vec3;

use crate::renderer::ClearFlags;
use crate::resources::RenderTargetOptions;

// ---------------------------------------------------------------------------
// ComposerSettings
// ---------------------------------------------------------------------------

/// Configuration of an [`EffectComposer`](crate::EffectComposer).
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSettings {
    /// Target size in CSS pixels; the renderer's size when `None`.
    pub size: Option<(u32, u32)>,
    /// Pixel ratio; the renderer's ratio when `None`.
    pub pixel_ratio: Option<f32>,
    /// Color format of the ping-pong targets.
    pub format: wgpu::TextureFormat,
    pub depth_buffer: bool,
    /// Required for `MaskPass`.
    pub stencil_buffer: bool,
    /// Route the last enabled pass to the screen.
    pub render_to_screen: bool,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        let target = RenderTargetOptions::default();
        Self {
            size: None,
            pixel_ratio: None,
            format: target.format,
            depth_buffer: target.depth_buffer,
            stencil_buffer: target.stencil_buffer,
            render_to_screen: true,
        }
    }
}

impl ComposerSettings {
    #[must_use]
    pub fn target_options(&self) -> RenderTargetOptions {
        RenderTargetOptions {
            format: self.format,
            depth_buffer: self.depth_buffer,
            stencil_buffer: self.stencil_buffer,
        }
    }
}

// ---------------------------------------------------------------------------
// RendererSettings
// ---------------------------------------------------------------------------

/// Configuration of the headless renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    /// Depth-sort render lists before drawing.
    pub sort_objects: bool,
    /// Honour per-material clipping planes.
    pub local_clipping_enabled: bool,
    /// Clear before each scene render.
    pub auto_clear: bool,
    /// Buffers an automatic clear touches.
    pub auto_clear_flags: ClearFlags,
    pub clear_color: Vec3,
    pub clear_alpha: f32,
    /// Whether the device can issue instanced draws.
    pub instancing_supported: bool,
    /// Whether the screen surface has a stencil buffer.
    pub stencil: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            pixel_ratio: 1.0,
            sort_objects: true,
            local_clipping_enabled: false,
            auto_clear: true,
            auto_clear_flags: ClearFlags::all(),
            clear_color: Vec3::ZERO,
            clear_alpha: 1.0,
            instancing_supported: true,
            stencil: true,
        }
    }
}
