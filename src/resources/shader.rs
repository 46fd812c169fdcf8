//! Fullscreen shader materials
//!
//! A [`ShaderMaterial`] is a named program plus a uniform table. Backends
//! resolve the program by [`ShaderMaterial::name`]; the uniform table is the
//! only channel through which passes feed it data (the input texture slot in
//! particular).
//!
//! [`ShaderDefinition`] is the static, shareable form. Each material built
//! from a definition receives its own deep copy of the uniforms, so two passes
//! created from the same definition never observe each other's bindings.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use super::target::TextureId;
use super::version_tracker::{ChangeTracker, MutGuard};

static NEXT_SHADER_ID: AtomicU64 = AtomicU64::new(1);

/// Value held by a uniform cell.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    /// Texture slot; `None` until a pass binds a source
    Texture(Option<TextureId>),
}

impl UniformValue {
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_texture(&self) -> Option<TextureId> {
        match self {
            Self::Texture(t) => *t,
            _ => None,
        }
    }
}

/// A uniform cell: the mutable box a program reads its value from.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub value: UniformValue,
}

impl Uniform {
    #[must_use]
    pub const fn new(value: UniformValue) -> Self {
        Self { value }
    }
}

pub type Uniforms = FxHashMap<String, Uniform>;

/// Static shader description.
#[derive(Debug, Clone, Copy)]
pub struct ShaderDefinition {
    pub name: &'static str,
    pub uniforms: &'static [(&'static str, fn() -> UniformValue)],
    pub defines: &'static [(&'static str, &'static str)],
    pub vertex_shader: &'static str,
    pub fragment_shader: &'static str,
}

impl ShaderDefinition {
    /// Fresh, independent uniform table.
    #[must_use]
    pub fn clone_uniforms(&self) -> Uniforms {
        self.uniforms
            .iter()
            .map(|(name, init)| ((*name).to_string(), Uniform::new(init())))
            .collect()
    }
}

/// Passthrough shader: samples `tDiffuse` and scales it by `opacity`.
pub const COPY_SHADER: ShaderDefinition = ShaderDefinition {
    name: "copy",
    uniforms: &[
        ("tDiffuse", || UniformValue::Texture(None)),
        ("opacity", || UniformValue::Float(1.0)),
    ],
    defines: &[],
    vertex_shader: "
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}
",
    fragment_shader: "
@group(0) @binding(0) var tDiffuse: texture_2d<f32>;
@group(0) @binding(1) var tDiffuseSampler: sampler;
@group(0) @binding(2) var<uniform> opacity: f32;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(tDiffuse, tDiffuseSampler, uv) * opacity;
}
",
};

// ============================================================================
// ShaderMaterial
// ============================================================================

#[derive(Debug)]
pub struct ShaderMaterial {
    id: u64,
    pub name: String,
    uniforms: Uniforms,
    pub defines: FxHashMap<String, String>,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub transparent: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    version: ChangeTracker,
}

impl ShaderMaterial {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: NEXT_SHADER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            uniforms: Uniforms::default(),
            defines: FxHashMap::default(),
            vertex_shader: String::new(),
            fragment_shader: String::new(),
            transparent: false,
            depth_test: false,
            depth_write: false,
            version: ChangeTracker::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.version()
    }

    #[must_use]
    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    /// Mutable access to the uniform table; the material version is bumped
    /// when the guard drops.
    pub fn uniforms_mut(&mut self) -> MutGuard<'_, Uniforms> {
        MutGuard::new(&mut self.uniforms, &mut self.version)
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name).map(|u| &u.value)
    }

    /// Writes an existing uniform. Returns `false` if the material has no
    /// uniform of that name.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        match self.uniforms.get_mut(name) {
            Some(cell) => {
                if cell.value != value {
                    cell.value = value;
                    self.version.changed();
                }
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.uniforms.insert(name.to_string(), Uniform::new(value));
        self
    }
}

impl From<&ShaderDefinition> for ShaderMaterial {
    fn from(definition: &ShaderDefinition) -> Self {
        let mut material = Self::new(definition.name);
        material.uniforms = definition.clone_uniforms();
        material.defines = definition
            .defines
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        material.vertex_shader = definition.vertex_shader.to_string();
        material.fragment_shader = definition.fragment_shader.to_string();
        material
    }
}

impl From<ShaderDefinition> for ShaderMaterial {
    fn from(definition: ShaderDefinition) -> Self {
        Self::from(&definition)
    }
}
