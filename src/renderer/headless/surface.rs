use glam::{Vec2, Vec4};
use rustc_hash::FxHashMap;

use crate::resources::{ShaderMaterial, TextureId, UniformValue};

/// CPU color/depth/stencil storage for one render target or the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    color: Vec<Vec4>,
    depth: Option<Vec<f32>>,
    stencil: Option<Vec<u8>>,
}

impl Surface {
    #[must_use]
    pub fn new(width: u32, height: u32, depth: bool, stencil: bool) -> Self {
        let len = (width * height) as usize;
        Self {
            width,
            height,
            color: vec![Vec4::ZERO; len],
            depth: depth.then(|| vec![1.0; len]),
            stencil: stencil.then(|| vec![0; len]),
        }
    }

    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn has_stencil(&self) -> bool {
        self.stencil.is_some()
    }

    #[must_use]
    pub fn pixels(&self) -> &[Vec4] {
        &self.color
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        self.offset(x, y).map(|i| self.color[i])
    }

    #[must_use]
    pub fn stencil_at(&self, x: u32, y: u32) -> Option<u8> {
        let i = self.offset(x, y)?;
        self.stencil.as_ref().map(|s| s[i])
    }

    #[must_use]
    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        let i = self.offset(x, y)?;
        self.depth.as_ref().map(|d| d[i])
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Nearest-neighbour lookup with clamp-to-edge addressing.
    #[must_use]
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        if self.color.is_empty() {
            return Vec4::ZERO;
        }
        let x = ((uv.x * self.width as f32).floor() as i64).clamp(0, i64::from(self.width) - 1);
        let y = ((uv.y * self.height as f32).floor() as i64).clamp(0, i64::from(self.height) - 1);
        self.color[(y as u32 * self.width + x as u32) as usize]
    }

    pub(crate) fn fill_color(&mut self, value: Vec4) {
        self.color.fill(value);
    }

    pub(crate) fn fill_depth(&mut self, value: f32) {
        if let Some(depth) = &mut self.depth {
            depth.fill(value);
        }
    }

    /// Stencil clear limited to the bits in `write_mask`.
    pub(crate) fn fill_stencil(&mut self, value: u8, write_mask: u8) {
        if let Some(stencil) = &mut self.stencil {
            for s in stencil.iter_mut() {
                *s = (*s & !write_mask) | (value & write_mask);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn color_mut(&mut self) -> &mut [Vec4] {
        &mut self.color
    }

    /// Splits into color, depth and stencil storage for a fragment loop.
    pub(crate) fn buffers_mut(&mut self) -> (&mut [Vec4], Option<&mut [f32]>, Option<&mut [u8]>) {
        (
            &mut self.color,
            self.depth.as_deref_mut(),
            self.stencil.as_deref_mut(),
        )
    }
}

/// Per-fragment inputs of a fullscreen program.
pub struct FragmentInput<'a> {
    /// Normalized coordinates of the fragment center
    pub uv: Vec2,
    /// Size of one texel of the output
    pub texel_size: Vec2,
    pub material: &'a ShaderMaterial,
    textures: &'a FxHashMap<TextureId, Surface>,
}

impl<'a> FragmentInput<'a> {
    pub(crate) fn new(
        uv: Vec2,
        texel_size: Vec2,
        material: &'a ShaderMaterial,
        textures: &'a FxHashMap<TextureId, Surface>,
    ) -> Self {
        Self {
            uv,
            texel_size,
            material,
            textures,
        }
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.material.uniform(name)
    }

    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.uniform(name).and_then(UniformValue::as_float)
    }

    /// Samples the texture bound to uniform `name`; unbound slots read zero.
    #[must_use]
    pub fn texture(&self, name: &str, uv: Vec2) -> Vec4 {
        self.uniform(name)
            .and_then(UniformValue::as_texture)
            .and_then(|id| self.textures.get(&id))
            .map_or(Vec4::ZERO, |surface| surface.sample(uv))
    }
}

/// CPU stand-in for a fragment shader.
pub type FragmentProgram = Box<dyn Fn(&FragmentInput<'_>) -> Vec4>;

/// `tDiffuse * opacity`.
#[must_use]
pub fn copy_program(input: &FragmentInput<'_>) -> Vec4 {
    input.texture("tDiffuse", input.uv) * input.float("opacity").unwrap_or(1.0)
}
