//! Effect Composer
//!
//! Runs an ordered list of [`Pass`]es against two ping-pong render targets.
//!
//! # Frame flow
//!
//! ```text
//!   for each enabled pass i:
//!       render_to_screen = composer.render_to_screen && i is the last enabled pass
//!       pass.render(write_buffer, read_buffer)
//!       if pass.needs_swap && !render_to_screen:
//!           if mask active: copy read -> write outside the stencil mask
//!           swap(write_buffer, read_buffer)
//!       MaskPass / ClearMaskPass toggle the mask flag
//! ```
//!
//! The mask flag is a two-state toggle: masks do not nest. The renderer's
//! bound target before the run is rebound afterwards, also when a pass fails.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut composer = EffectComposer::new(renderer);
//! composer.add_pass(RenderPass::new(scene.clone(), camera.clone()));
//! composer.add_pass(ShaderPass::new(&COPY_SHADER));
//! composer.render(Some(1.0 / 60.0))?;
//! ```

use std::time::Instant;

use wgpu::CompareFunction;

use super::pass::{MaskRole, Pass, PassContext};
use super::passes::ShaderPass;
use crate::errors::{Result, StrataError};
use crate::renderer::backend::Renderer;
use crate::resources::{COPY_SHADER, RenderTarget, RenderTargetOptions};
use crate::settings::ComposerSettings;

pub struct EffectComposer<R: Renderer> {
    renderer: R,
    write_buffer: RenderTarget,
    read_buffer: RenderTarget,
    passes: Vec<Box<dyn Pass>>,
    copy_pass: ShaderPass,

    width: u32,
    height: u32,
    pixel_ratio: f32,
    /// Route the last enabled pass to the screen
    pub render_to_screen: bool,

    last_render: Option<Instant>,
    disposed: bool,
}

impl<R: Renderer> EffectComposer<R> {
    /// Composer sized after the renderer, with default target options.
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self::with_settings(renderer, &ComposerSettings::default())
    }

    #[must_use]
    pub fn with_settings(renderer: R, settings: &ComposerSettings) -> Self {
        let (width, height) = settings.size.unwrap_or_else(|| renderer.size());
        let pixel_ratio = settings.pixel_ratio.unwrap_or_else(|| renderer.pixel_ratio());
        let (w, h) = effective_size(width, height, pixel_ratio);
        let target = RenderTarget::new(w, h, settings.target_options());
        Self::from_target(renderer, target, width, height, pixel_ratio, settings.render_to_screen)
    }

    /// Composer whose targets copy the configuration of `target`. The pixel
    /// ratio is 1 and the size is the target's.
    #[must_use]
    pub fn with_render_target(renderer: R, target: RenderTarget) -> Self {
        let (width, height) = target.size();
        Self::from_target(renderer, target, width, height, 1.0, true)
    }

    fn from_target(
        renderer: R,
        target: RenderTarget,
        width: u32,
        height: u32,
        pixel_ratio: f32,
        render_to_screen: bool,
    ) -> Self {
        let (write_buffer, read_buffer) = ping_pong(target);
        Self {
            renderer,
            write_buffer,
            read_buffer,
            passes: Vec::new(),
            copy_pass: ShaderPass::new(&COPY_SHADER),
            width,
            height,
            pixel_ratio,
            render_to_screen,
            last_render: None,
            disposed: false,
        }
    }

    // ========================================================================
    // Pass list
    // ========================================================================

    /// Appends a pass and tells it the current effective size.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.add_boxed(Box::new(pass));
    }

    pub fn add_boxed(&mut self, mut pass: Box<dyn Pass>) {
        let (w, h) = self.effective_size();
        pass.set_size(w, h);
        self.passes.push(pass);
    }

    /// Inserts a pass before `index` (`index == len` appends).
    pub fn insert_pass(&mut self, pass: impl Pass + 'static, index: usize) -> Result<()> {
        if index > self.passes.len() {
            return Err(StrataError::PassIndexOutOfBounds {
                index,
                len: self.passes.len(),
            });
        }
        let mut pass: Box<dyn Pass> = Box::new(pass);
        let (w, h) = self.effective_size();
        pass.set_size(w, h);
        self.passes.insert(index, pass);
        Ok(())
    }

    /// Removes and returns the pass at `index`.
    pub fn remove_pass(&mut self, index: usize) -> Option<Box<dyn Pass>> {
        (index < self.passes.len()).then(|| self.passes.remove(index))
    }

    /// Whether no pass after `index` is enabled.
    #[must_use]
    pub fn is_last_enabled_pass(&self, index: usize) -> bool {
        !self
            .passes
            .iter()
            .skip(index.saturating_add(1))
            .any(|pass| pass.enabled())
    }

    /// Checks that every `MaskPass` is closed by a `ClearMaskPass` among the
    /// enabled passes. Not called by [`EffectComposer::render`].
    pub fn validate(&self) -> Result<()> {
        let mut open: Option<usize> = None;
        for (index, pass) in self.passes.iter().enumerate() {
            if !pass.enabled() {
                continue;
            }
            match (pass.mask_role(), open) {
                (MaskRole::Begin, Some(_)) => {
                    return Err(StrataError::UnpairedMask {
                        index,
                        reason: "mask opened while another mask is active",
                    });
                }
                (MaskRole::Begin, None) => open = Some(index),
                (MaskRole::End, None) => {
                    return Err(StrataError::UnpairedMask {
                        index,
                        reason: "mask cleared without an active mask",
                    });
                }
                (MaskRole::End, Some(_)) => open = None,
                (MaskRole::None, _) => {}
            }
        }
        match open {
            Some(index) => Err(StrataError::UnpairedMask {
                index,
                reason: "mask never cleared",
            }),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Runs every enabled pass once. `None` measures the delta since the
    /// previous call.
    pub fn render(&mut self, delta_time: Option<f32>) -> Result<()> {
        if self.disposed {
            return Err(StrataError::ComposerDisposed);
        }
        let now = Instant::now();
        let delta = delta_time.unwrap_or_else(|| {
            self.last_render
                .map_or(0.0, |last| now.duration_since(last).as_secs_f32())
        });
        self.last_render = Some(now);

        let previous = self.renderer.render_target().cloned();
        let result = self.run_passes(delta);
        self.renderer.set_render_target(previous.as_ref());
        result
    }

    fn run_passes(&mut self, delta_time: f32) -> Result<()> {
        let mut mask_active = false;

        for index in 0..self.passes.len() {
            if !self.passes[index].enabled() {
                continue;
            }
            let to_screen = self.render_to_screen && self.is_last_enabled_pass(index);

            let pass = &mut self.passes[index];
            pass.state_mut().render_to_screen = to_screen;
            let mut ctx = PassContext {
                renderer: &mut self.renderer,
                write_buffer: &self.write_buffer,
                read_buffer: &self.read_buffer,
                delta_time,
                mask_active,
            };
            pass.render(&mut ctx)?;
            let needs_swap = pass.needs_swap();
            let role = pass.mask_role();

            // Screen output never feeds back into the ping-pong pair.
            if needs_swap && !to_screen {
                if mask_active {
                    self.copy_outside_mask(delta_time)?;
                }
                self.swap_buffers();
            }

            match role {
                MaskRole::Begin => mask_active = true,
                MaskRole::End => mask_active = false,
                MaskRole::None => {}
            }
        }

        if mask_active {
            log::warn!("EffectComposer: sequence ended with an active stencil mask");
        }
        Ok(())
    }

    /// Carries the previous image into the write buffer wherever the mask
    /// kept the last pass from drawing.
    fn copy_outside_mask(&mut self, delta_time: f32) -> Result<()> {
        self.renderer
            .state_mut()
            .stencil
            .set_func(CompareFunction::NotEqual, 1, 0xffff_ffff);
        let mut ctx = PassContext {
            renderer: &mut self.renderer,
            write_buffer: &self.write_buffer,
            read_buffer: &self.read_buffer,
            delta_time,
            mask_active: true,
        };
        let result = self.copy_pass.render(&mut ctx);
        self.renderer
            .state_mut()
            .stencil
            .set_func(CompareFunction::Equal, 1, 0xffff_ffff);
        result
    }

    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.write_buffer, &mut self.read_buffer);
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// Replaces both targets, releasing the old ones. Without `target`, new
    /// targets copy the current configuration at the renderer's size and
    /// pixel ratio. A disposed composer becomes usable again.
    pub fn reset(&mut self, target: Option<RenderTarget>) {
        let target = target.unwrap_or_else(|| {
            let (width, height) = self.renderer.size();
            self.width = width;
            self.height = height;
            self.pixel_ratio = self.renderer.pixel_ratio();
            let (w, h) = self.effective_size();
            let mut target = self.write_buffer.duplicate();
            target.set_size(w, h);
            target
        });
        self.release_targets();
        let (write_buffer, read_buffer) = ping_pong(target);
        self.write_buffer = write_buffer;
        self.read_buffer = read_buffer;
        self.disposed = false;
    }

    /// Resizes both targets and every pass.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        let (w, h) = self.effective_size();
        self.write_buffer.set_size(w, h);
        self.read_buffer.set_size(w, h);
        for pass in &mut self.passes {
            pass.set_size(w, h);
        }
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
        self.set_size(self.width, self.height);
    }

    /// Releases both targets and the internal copy pass. `render` fails until
    /// [`EffectComposer::reset`] is called.
    pub fn dispose(&mut self) {
        self.release_targets();
        self.copy_pass.dispose(&mut self.renderer);
        self.disposed = true;
    }

    fn release_targets(&mut self) {
        self.renderer.dispose_render_target(&self.write_buffer);
        self.renderer.dispose_render_target(&self.read_buffer);
    }

    fn effective_size(&self) -> (u32, u32) {
        effective_size(self.width, self.height, self.pixel_ratio)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn passes(&self) -> &[Box<dyn Pass>] {
        &self.passes
    }

    pub fn pass_mut(&mut self, index: usize) -> Option<&mut (dyn Pass + 'static)> {
        self.passes.get_mut(index).map(Box::as_mut)
    }

    #[must_use]
    pub fn write_buffer(&self) -> &RenderTarget {
        &self.write_buffer
    }

    #[must_use]
    pub fn read_buffer(&self) -> &RenderTarget {
        &self.read_buffer
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn set_render_to_screen(&mut self, render_to_screen: bool) {
        self.render_to_screen = render_to_screen;
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    #[must_use]
    pub fn target_options(&self) -> RenderTargetOptions {
        *self.write_buffer.options()
    }

    /// Consumes the composer and hands back its renderer.
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

fn effective_size(width: u32, height: u32, pixel_ratio: f32) -> (u32, u32) {
    (
        (width as f32 * pixel_ratio) as u32,
        (height as f32 * pixel_ratio) as u32,
    )
}

fn ping_pong(target: RenderTarget) -> (RenderTarget, RenderTarget) {
    let first = target.with_label("EffectComposer.rt1");
    let second = first.duplicate().with_label("EffectComposer.rt2");
    (first, second)
}
