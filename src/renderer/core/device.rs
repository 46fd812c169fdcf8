//! Device seam
//!
//! The registries never talk to a graphics API directly. They issue buffer,
//! vertex-array and draw commands through [`GpuDevice`], which a backend
//! implements over its native context. Handles are opaque integers the
//! device hands out.

use crate::resources::{ElementType, UsageHint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBufferHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u64);

/// Primitive assembly of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Triangles,
    Lines,
    LineStrip,
    LineLoop,
    Points,
}

/// Index buffer bound for an indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBinding {
    pub buffer: GpuBufferHandle,
    pub element_type: ElementType,
}

/// A fully resolved draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub mode: DrawMode,
    pub start: u32,
    pub count: u32,
    /// `None` for non-instanced draws
    pub instance_count: Option<u32>,
    pub index: Option<IndexBinding>,
}

pub trait GpuDevice {
    /// Allocates a buffer initialised with `data`.
    fn create_buffer(
        &mut self,
        usage: wgpu::BufferUsages,
        data: &[u8],
        hint: UsageHint,
    ) -> GpuBufferHandle;

    /// Writes `data` at byte `offset` of an existing buffer.
    fn write_buffer(&mut self, buffer: GpuBufferHandle, offset: u64, data: &[u8]);

    fn delete_buffer(&mut self, buffer: GpuBufferHandle);

    fn create_vertex_array(&mut self) -> VertexArrayHandle;

    fn delete_vertex_array(&mut self, vao: VertexArrayHandle);

    fn supports_instancing(&self) -> bool;

    fn draw(&mut self, command: &DrawCommand);
}
