//! Clipping-plane projector
//!
//! Converts world-space clipping planes into the camera-space coefficient
//! buffer a fragment stage consumes: four floats per plane (`nx, ny, nz, d`),
//! global planes first, material planes after them.
//!
//! # Frame protocol
//!
//! 1. [`Clipping::init`] once per scene render with the global planes.
//! 2. [`Clipping::set_state`] per draw with the material's planes; without
//!    usable local planes the uniform falls back to the global projection.
//! 3. [`Clipping::begin_shadows`] / [`Clipping::end_shadows`] around shadow
//!    passes, during which global planes are suppressed.
//!
//! The merged per-material buffer is cached in that material's
//! [`PropertyRecord`] so a draw with an unchanged camera can skip projection.

use glam::{Mat3, Mat4};

use super::core::PropertyRecord;
use crate::resources::Plane;
use crate::scene::Camera;

/// Property-record key of the cached merged plane buffer.
pub const CLIPPING_STATE_KEY: &str = "clipping_state";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UniformSource {
    Empty,
    Global,
    Local,
}

/// Mirror of the shader's clipping-plane uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippingUniform {
    pub value: Vec<f32>,
    /// Raised whenever `value` is rebound and must be re-sent
    pub needs_update: bool,
}

#[derive(Debug)]
pub struct Clipping {
    global_state: Vec<f32>,
    num_global_planes: usize,
    local_clipping_enabled: bool,
    rendering_shadows: bool,
    uniform: ClippingUniform,
    source: UniformSource,
    /// Planes active for the current draw
    pub num_planes: usize,
    /// Leading planes combined by intersection rather than union
    pub num_intersection: usize,
}

impl Default for Clipping {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipping {
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_state: Vec::new(),
            num_global_planes: 0,
            local_clipping_enabled: false,
            rendering_shadows: false,
            uniform: ClippingUniform {
                value: Vec::new(),
                needs_update: false,
            },
            source: UniformSource::Empty,
            num_planes: 0,
            num_intersection: 0,
        }
    }

    /// Projects the global planes for `camera`.
    ///
    /// Returns whether clipping is active: planes are set now or were set on
    /// the previous call, or local clipping is enabled now or was before. The
    /// caller keeps propagating state for one more frame after clipping is
    /// switched off so shaders observe the drop to zero planes.
    pub fn init(&mut self, planes: &[Plane], enable_local_clipping: bool, camera: &Camera) -> bool {
        let enabled = !planes.is_empty()
            || enable_local_clipping
            || self.num_global_planes != 0
            || self.local_clipping_enabled;

        self.local_clipping_enabled = enable_local_clipping;

        project_planes(planes, camera, &mut self.global_state, 0);
        self.num_global_planes = planes.len();
        self.bind_global();
        self.num_planes = planes.len();
        self.num_intersection = 0;

        enabled
    }

    /// Binds the global projection to the uniform.
    pub fn reset_global_state(&mut self) {
        if self.source != UniformSource::Global {
            self.bind_global();
        }
        self.num_planes = self.num_global_planes;
        self.num_intersection = 0;
    }

    fn bind_global(&mut self) {
        let len = self.num_global_planes * 4;
        self.uniform.value.clear();
        self.uniform
            .value
            .extend_from_slice(&self.global_state[..len]);
        self.uniform.needs_update = self.num_global_planes > 0;
        self.source = UniformSource::Global;
    }

    pub fn begin_shadows(&mut self) {
        self.rendering_shadows = true;
        self.num_planes = 0;
        self.num_intersection = 0;
    }

    pub fn end_shadows(&mut self) {
        self.rendering_shadows = false;
        self.reset_global_state();
    }

    /// Configures the uniform for one draw.
    ///
    /// `cache` is the material's property record; with `from_cache` set and a
    /// cached buffer present, the local planes are not re-projected.
    pub fn set_state(
        &mut self,
        planes: &[Plane],
        clip_intersection: bool,
        clip_shadows: bool,
        camera: &Camera,
        cache: &mut PropertyRecord,
        from_cache: bool,
    ) {
        if !self.local_clipping_enabled
            || planes.is_empty()
            || (self.rendering_shadows && !clip_shadows)
        {
            if self.rendering_shadows {
                self.num_planes = 0;
                self.num_intersection = 0;
            } else {
                self.reset_global_state();
            }
            return;
        }

        let n_global = if self.rendering_shadows {
            0
        } else {
            self.num_global_planes
        };
        let l_global = n_global * 4;
        let flat_size = l_global + planes.len() * 4;

        let Some(merged) = cache.get_or_insert_with::<Vec<f32>>(CLIPPING_STATE_KEY, Vec::new)
        else {
            self.reset_global_state();
            return;
        };
        if !from_cache || merged.len() < flat_size {
            project_planes(planes, camera, merged, l_global);
        }
        merged[..l_global].copy_from_slice(&self.global_state[..l_global]);

        self.uniform.value.clear();
        self.uniform.value.extend_from_slice(&merged[..flat_size]);
        self.uniform.needs_update = true;
        self.source = UniformSource::Local;

        self.num_planes = planes.len();
        self.num_intersection = if clip_intersection { self.num_planes } else { 0 };
        self.num_planes += n_global;
    }

    #[must_use]
    pub fn uniform(&self) -> &ClippingUniform {
        &self.uniform
    }

    pub fn uniform_mut(&mut self) -> &mut ClippingUniform {
        &mut self.uniform
    }

    /// Coefficients of the planes active for the current draw.
    #[must_use]
    pub fn planes(&self) -> &[f32] {
        let len = (self.num_planes * 4).min(self.uniform.value.len());
        &self.uniform.value[..len]
    }

    #[must_use]
    pub fn num_global_planes(&self) -> usize {
        self.num_global_planes
    }

    #[must_use]
    pub fn local_clipping_enabled(&self) -> bool {
        self.local_clipping_enabled
    }
}

/// Writes the camera-space form of `planes` into `dst` from `offset` on.
///
/// `dst` only grows; an existing larger buffer keeps its tail untouched.
pub fn project_planes(planes: &[Plane], camera: &Camera, dst: &mut Vec<f32>, offset: usize) {
    if planes.is_empty() {
        return;
    }
    let flat_size = offset + planes.len() * 4;
    if dst.len() < flat_size {
        dst.resize(flat_size, 0.0);
    }

    let view: &Mat4 = camera.view_matrix();
    let normal_matrix: Mat3 = camera.view_normal_matrix();
    for (i, plane) in planes.iter().enumerate() {
        let projected = plane.apply_matrix4(view, &normal_matrix);
        let at = offset + i * 4;
        dst[at..at + 4].copy_from_slice(&projected.to_vec4().to_array());
    }
}
