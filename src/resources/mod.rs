//! Core resource definitions
//!
//! CPU-side data the renderer consumes, independent of any GPU backend:
//! - Buffer: shared, versioned attribute storage
//! - Attribute: typed views into buffers
//! - Geometry: buffer and polygon geometry
//! - Material: mesh surface flags and clipping planes
//! - Shader: fullscreen shader materials and uniforms
//! - Target: off-screen render target descriptors

pub mod attribute;
pub mod buffer;
pub mod geometry;
pub mod material;
pub mod plane;
pub mod shader;
pub mod target;
pub mod version_tracker;

pub use attribute::Attribute;
pub use buffer::{BufferId, BufferRef, Element, ElementType, UpdateRange, UsageHint};
pub use geometry::{BufferGeometry, Geometry, GeometryGroup, GeometryId, PolygonGeometry};
pub use material::{Material, MaterialId};
pub use plane::Plane;
pub use shader::{COPY_SHADER, ShaderDefinition, ShaderMaterial, Uniform, UniformValue, Uniforms};
pub use target::{RenderTarget, RenderTargetId, RenderTargetOptions, TextureId};
pub use version_tracker::{ChangeTracker, MutGuard};
