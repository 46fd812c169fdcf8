//! GPU resource tracking
//!
//! Registries keyed by resource identity that keep GPU state in step with the
//! CPU-side data:
//!
//! - [`AttributeCache`]: one GPU buffer per CPU buffer, version-checked uploads
//! - [`GeometryRegistry`]: geometry membership, wireframe indices, disposal
//! - [`ObjectCache`]: once-per-frame geometry updates and instance buffers
//! - [`PropertyStore`]: open per-resource side records
//! - [`BindingStates`]: vertex-array objects per geometry/material pair
//!
//! All registries talk to the backend through [`GpuDevice`].

pub mod attributes;
pub mod bindings;
pub mod device;
pub mod draw;
pub mod geometries;
pub mod info;
pub mod objects;
pub mod properties;

pub use attributes::{AttributeCache, GpuAttribute};
pub use bindings::BindingStates;
pub use device::{DrawCommand, DrawMode, GpuBufferHandle, GpuDevice, IndexBinding, VertexArrayHandle};
pub use draw::BufferRenderer;
pub use geometries::{DisposeReport, GeometryRegistry};
pub use info::{FrameInfo, MemoryInfo, RenderInfo};
pub use objects::ObjectCache;
pub use properties::{PropertyRecord, PropertyStore, ResourceKey};
