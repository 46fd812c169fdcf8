use rustc_hash::{FxHashMap, FxHashSet};

use crate::renderer::core::{DrawCommand, GpuBufferHandle, GpuDevice, VertexArrayHandle};
use crate::resources::UsageHint;

/// A buffer write as seen by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRecord {
    pub buffer: GpuBufferHandle,
    pub offset: u64,
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferRecord {
    usage: wgpu::BufferUsages,
    size: usize,
    hint: UsageHint,
}

/// Counters kept by [`RecordingDevice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub buffers_created: usize,
    pub buffers_deleted: usize,
    pub buffer_writes: usize,
    pub bytes_uploaded: usize,
    pub vertex_arrays_created: usize,
    pub vertex_arrays_deleted: usize,
    pub draws: usize,
}

impl DeviceStats {
    /// Every data transfer: initial fills plus writes.
    #[must_use]
    pub fn uploads(&self) -> usize {
        self.buffers_created + self.buffer_writes
    }
}

/// [`GpuDevice`] that keeps bookkeeping instead of GPU memory.
#[derive(Debug)]
pub struct RecordingDevice {
    next_handle: u64,
    instancing: bool,
    buffers: FxHashMap<GpuBufferHandle, BufferRecord>,
    vertex_arrays: FxHashSet<VertexArrayHandle>,
    uploads: Vec<UploadRecord>,
    draws: Vec<DrawCommand>,
    stats: DeviceStats,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RecordingDevice {
    #[must_use]
    pub fn new(instancing: bool) -> Self {
        Self {
            next_handle: 1,
            instancing,
            buffers: FxHashMap::default(),
            vertex_arrays: FxHashSet::default(),
            uploads: Vec::new(),
            draws: Vec::new(),
            stats: DeviceStats::default(),
        }
    }

    fn next(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    #[must_use]
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    #[must_use]
    pub fn uploads(&self) -> &[UploadRecord] {
        &self.uploads
    }

    #[must_use]
    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }

    /// Live buffers.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn buffer_size(&self, buffer: GpuBufferHandle) -> Option<usize> {
        self.buffers.get(&buffer).map(|b| b.size)
    }

    #[must_use]
    pub fn buffer_hint(&self, buffer: GpuBufferHandle) -> Option<UsageHint> {
        self.buffers.get(&buffer).map(|b| b.hint)
    }

    #[must_use]
    pub fn buffer_usage(&self, buffer: GpuBufferHandle) -> Option<wgpu::BufferUsages> {
        self.buffers.get(&buffer).map(|b| b.usage)
    }

    #[must_use]
    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn set_instancing(&mut self, supported: bool) {
        self.instancing = supported;
    }

    /// Forgets recorded uploads and draws; counters are kept.
    pub fn clear_log(&mut self) {
        self.uploads.clear();
        self.draws.clear();
    }
}

impl GpuDevice for RecordingDevice {
    fn create_buffer(
        &mut self,
        usage: wgpu::BufferUsages,
        data: &[u8],
        hint: UsageHint,
    ) -> GpuBufferHandle {
        let buffer = GpuBufferHandle(self.next());
        self.buffers.insert(
            buffer,
            BufferRecord {
                usage,
                size: data.len(),
                hint,
            },
        );
        self.stats.buffers_created += 1;
        self.stats.bytes_uploaded += data.len();
        self.uploads.push(UploadRecord {
            buffer,
            offset: 0,
            len: data.len(),
        });
        buffer
    }

    fn write_buffer(&mut self, buffer: GpuBufferHandle, offset: u64, data: &[u8]) {
        let Some(record) = self.buffers.get(&buffer) else {
            log::warn!("RecordingDevice: write to unknown buffer {buffer:?}");
            return;
        };
        if offset as usize + data.len() > record.size {
            log::warn!(
                "RecordingDevice: write {}..{} overflows buffer {:?} of {} bytes",
                offset,
                offset as usize + data.len(),
                buffer,
                record.size
            );
        }
        self.stats.buffer_writes += 1;
        self.stats.bytes_uploaded += data.len();
        self.uploads.push(UploadRecord {
            buffer,
            offset,
            len: data.len(),
        });
    }

    fn delete_buffer(&mut self, buffer: GpuBufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            self.stats.buffers_deleted += 1;
        } else {
            log::warn!("RecordingDevice: double delete of buffer {buffer:?}");
        }
    }

    fn create_vertex_array(&mut self) -> VertexArrayHandle {
        let vao = VertexArrayHandle(self.next());
        self.vertex_arrays.insert(vao);
        self.stats.vertex_arrays_created += 1;
        vao
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayHandle) {
        if self.vertex_arrays.remove(&vao) {
            self.stats.vertex_arrays_deleted += 1;
        }
    }

    fn supports_instancing(&self) -> bool {
        self.instancing
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.stats.draws += 1;
        self.draws.push(*command);
    }
}
