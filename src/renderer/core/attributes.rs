//! Attribute upload cache
//!
//! Maps each CPU buffer to its GPU counterpart and keeps the two in sync by
//! version. Interleaved views resolve to their shared store before lookup, so
//! the store is uploaded exactly once no matter how many views reference it.

use rustc_hash::FxHashMap;

use super::device::{GpuBufferHandle, GpuDevice};
use crate::resources::{Attribute, BufferId, BufferRef, ElementType};

/// GPU-side record for one CPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuAttribute {
    pub buffer: GpuBufferHandle,
    pub usage: wgpu::BufferUsages,
    pub element_type: ElementType,
    pub bytes_per_element: usize,
    /// CPU version last uploaded
    pub version: u64,
    /// Allocated size in bytes
    pub size: u64,
}

#[derive(Debug, Default)]
pub struct AttributeCache {
    buffers: FxHashMap<BufferId, GpuAttribute>,
}

impl AttributeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, attribute: &Attribute) -> Option<&GpuAttribute> {
        self.buffers.get(&attribute.buffer().id())
    }

    #[must_use]
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Ensures the GPU copy of `attribute`'s store is current.
    ///
    /// Creates the GPU buffer on first sight. Afterwards, uploads only when the
    /// CPU version is ahead of the recorded one, honouring a pending update
    /// range and recreating the buffer if the data outgrew it.
    pub fn update(
        &mut self,
        device: &mut dyn GpuDevice,
        attribute: &Attribute,
        usage: wgpu::BufferUsages,
    ) -> GpuAttribute {
        let store = attribute.buffer();
        match self.buffers.get_mut(&store.id()) {
            None => {
                let record = create_buffer(device, store, usage);
                self.buffers.insert(store.id(), record);
                record
            }
            Some(record) => {
                if record.version < store.version() {
                    update_buffer(device, record, store);
                }
                *record
            }
        }
    }

    /// Releases the GPU buffer backing `attribute`. No-op if absent.
    pub fn remove(&mut self, device: &mut dyn GpuDevice, attribute: &Attribute) -> bool {
        self.remove_buffer(device, attribute.buffer().id())
    }

    pub fn remove_buffer(&mut self, device: &mut dyn GpuDevice, id: BufferId) -> bool {
        if let Some(record) = self.buffers.remove(&id) {
            device.delete_buffer(record.buffer);
            true
        } else {
            false
        }
    }

    /// Releases every GPU buffer.
    pub fn dispose(&mut self, device: &mut dyn GpuDevice) {
        for (_, record) in self.buffers.drain() {
            device.delete_buffer(record.buffer);
        }
    }
}

fn create_buffer(
    device: &mut dyn GpuDevice,
    store: &BufferRef,
    usage: wgpu::BufferUsages,
) -> GpuAttribute {
    // A fresh buffer receives the whole array; any pending range is moot.
    store.take_update_range();
    let version = store.version();
    let contents = store.read();
    let bytes = contents.bytes();
    let buffer = device.create_buffer(usage, bytes, store.usage());
    GpuAttribute {
        buffer,
        usage,
        element_type: store.element_type(),
        bytes_per_element: store.bytes_per_element(),
        version,
        size: bytes.len() as u64,
    }
}

fn update_buffer(device: &mut dyn GpuDevice, record: &mut GpuAttribute, store: &BufferRef) {
    let range = store.take_update_range();
    let version = store.version();
    let contents = store.read();
    let bytes = contents.bytes();

    if bytes.len() as u64 > record.size {
        log::debug!(
            "Resizing attribute buffer {:?} from {} to {}",
            store.label(),
            record.size,
            bytes.len()
        );
        device.delete_buffer(record.buffer);
        record.buffer = device.create_buffer(record.usage, bytes, store.usage());
        record.size = bytes.len() as u64;
    } else if let Some(range) = range {
        let bpe = record.bytes_per_element;
        let start = (range.offset * bpe).min(bytes.len());
        let end = ((range.offset + range.count) * bpe).min(bytes.len());
        device.write_buffer(record.buffer, start as u64, &bytes[start..end]);
    } else {
        device.write_buffer(record.buffer, 0, bytes);
    }

    record.element_type = store.element_type();
    record.bytes_per_element = store.bytes_per_element();
    record.version = version;
}
