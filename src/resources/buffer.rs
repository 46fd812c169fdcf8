//! CPU-side attribute storage
//!
//! [`BufferRef`] is a cheap, clonable handle to a typed array shared between
//! the scene graph and the GPU upload caches. Several [`Attribute`](super::Attribute)
//! views may share one buffer (interleaved layouts); caches key their GPU
//! records by the buffer, never by the view.
//!
//! Each buffer carries a monotonically increasing version. Any mutation bumps
//! it, and the caches compare their recorded version against it to decide
//! whether an upload is due. An optional pending [`UpdateRange`] restricts
//! the next upload to a sub-range of elements.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::Pod;
use parking_lot::{RwLock, RwLockReadGuard};

use super::version_tracker::AtomicVersion;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a [`DataBuffer`], stable for the lifetime of the allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

// ============================================================================
// Element types
// ============================================================================

/// Scalar type of the elements stored in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Int,
    Short,
    Byte,
}

impl ElementType {
    #[inline]
    #[must_use]
    pub const fn bytes_per_element(self) -> usize {
        match self {
            Self::Float | Self::UnsignedInt | Self::Int => 4,
            Self::UnsignedShort | Self::Short => 2,
            Self::UnsignedByte | Self::Byte => 1,
        }
    }
}

/// Types that can back an attribute array.
pub trait Element: Pod {
    const ELEMENT_TYPE: ElementType;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl Element for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;
        })*
    };
}

impl_element! {
    f32 => Float,
    u32 => UnsignedInt,
    u16 => UnsignedShort,
    u8 => UnsignedByte,
    i32 => Int,
    i16 => Short,
    i8 => Byte,
}

/// Hint for how often the data is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageHint {
    #[default]
    Static,
    Dynamic,
    Stream,
}

/// Element range restricting the next upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRange {
    /// First element to upload
    pub offset: usize,
    /// Number of elements
    pub count: usize,
}

impl UpdateRange {
    #[must_use]
    fn union(self, other: Self) -> Self {
        let start = self.offset.min(other.offset);
        let end = (self.offset + self.count).max(other.offset + other.count);
        Self {
            offset: start,
            count: end - start,
        }
    }
}

// ============================================================================
// DataBuffer
// ============================================================================

/// Raw bytes plus the pending partial-update range.
#[derive(Debug)]
pub struct BufferContents {
    bytes: Vec<u8>,
    update_range: Option<UpdateRange>,
}

impl BufferContents {
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn update_range(&self) -> Option<UpdateRange> {
        self.update_range
    }
}

#[derive(Debug)]
pub struct DataBuffer {
    id: BufferId,
    label: String,
    element_type: ElementType,
    /// Elements per vertex; equals the item size for non-interleaved data
    stride: usize,
    usage: UsageHint,
    version: AtomicVersion,
    contents: RwLock<BufferContents>,
}

/// Shared handle to a [`DataBuffer`]. Equality and hashing use the buffer id.
#[derive(Debug, Clone)]
pub struct BufferRef(Arc<DataBuffer>);

impl PartialEq for BufferRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for BufferRef {}

impl std::hash::Hash for BufferRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl BufferRef {
    /// Creates a buffer whose vertices are `stride` elements apart.
    #[must_use]
    pub fn new<T: Element>(data: &[T], stride: usize, label: Option<&str>) -> Self {
        Self::from_bytes(
            bytemuck::cast_slice(data).to_vec(),
            T::ELEMENT_TYPE,
            stride,
            label,
        )
    }

    #[must_use]
    pub fn from_bytes(
        bytes: Vec<u8>,
        element_type: ElementType,
        stride: usize,
        label: Option<&str>,
    ) -> Self {
        Self(Arc::new(DataBuffer {
            id: BufferId(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.unwrap_or("Buffer").to_string(),
            element_type,
            stride: stride.max(1),
            usage: UsageHint::Static,
            version: AtomicVersion::new(0),
            contents: RwLock::new(BufferContents {
                bytes,
                update_range: None,
            }),
        }))
    }

    /// Sets the usage hint. Only meaningful before the first upload.
    #[must_use]
    pub fn with_usage(mut self, usage: UsageHint) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.0) {
            inner.usage = usage;
        } else {
            log::warn!("Buffer '{}' is already shared; usage hint ignored", self.0.label);
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.0.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Lock-free version read.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version.get()
    }

    /// Overrides the version, used for derived buffers that mirror a source.
    #[inline]
    pub fn set_version(&self, version: u64) {
        self.0.version.set(version);
    }

    #[inline]
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.0.element_type
    }

    #[inline]
    #[must_use]
    pub fn bytes_per_element(&self) -> usize {
        self.0.element_type.bytes_per_element()
    }

    #[inline]
    #[must_use]
    pub fn stride(&self) -> usize {
        self.0.stride
    }

    #[inline]
    #[must_use]
    pub fn usage(&self) -> UsageHint {
        self.0.usage
    }

    /// Number of scalar elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.contents.read().bytes.len() / self.bytes_per_element()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of vertices (elements / stride).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.len() / self.0.stride
    }

    pub fn read(&self) -> RwLockReadGuard<'_, BufferContents> {
        self.0.contents.read()
    }

    /// Reads one element widened to `u32`. Used for index data.
    #[must_use]
    pub fn index_at(&self, i: usize) -> Option<u32> {
        let contents = self.0.contents.read();
        read_index(&contents.bytes, self.0.element_type, i)
    }

    /// Reads one element as `f32`.
    #[must_use]
    pub fn float_at(&self, i: usize) -> Option<f32> {
        let contents = self.0.contents.read();
        let bpe = self.bytes_per_element();
        let chunk = contents.bytes.get(i * bpe..(i + 1) * bpe)?;
        Some(match self.0.element_type {
            ElementType::Float => bytemuck::pod_read_unaligned::<f32>(chunk),
            ElementType::UnsignedInt => bytemuck::pod_read_unaligned::<u32>(chunk) as f32,
            ElementType::Int => bytemuck::pod_read_unaligned::<i32>(chunk) as f32,
            ElementType::UnsignedShort => f32::from(bytemuck::pod_read_unaligned::<u16>(chunk)),
            ElementType::Short => f32::from(bytemuck::pod_read_unaligned::<i16>(chunk)),
            ElementType::UnsignedByte => f32::from(chunk[0]),
            ElementType::Byte => f32::from(chunk[0] as i8),
        })
    }

    /// Replaces the whole array. Clears any pending range.
    ///
    /// Data of a different element type is rejected and leaves the buffer
    /// untouched.
    pub fn update<T: Element>(&self, data: &[T]) -> bool {
        if T::ELEMENT_TYPE != self.0.element_type {
            log::error!(
                "Buffer '{}': replacement with {:?} data on a {:?} buffer",
                self.0.label,
                T::ELEMENT_TYPE,
                self.0.element_type
            );
            return false;
        }
        {
            let mut contents = self.0.contents.write();
            contents.bytes = bytemuck::cast_slice(data).to_vec();
            contents.update_range = None;
        }
        self.0.version.bump();
        true
    }

    /// Overwrites `data.len()` elements starting at element `offset` and
    /// records the range so the next upload only touches those elements.
    ///
    /// Ranges written between two uploads are merged.
    pub fn update_region<T: Element>(&self, offset: usize, data: &[T]) -> bool {
        if T::ELEMENT_TYPE != self.0.element_type {
            log::error!(
                "Buffer '{}': partial update with {:?} data on a {:?} buffer",
                self.0.label,
                T::ELEMENT_TYPE,
                self.0.element_type
            );
            return false;
        }
        let bpe = self.bytes_per_element();
        {
            let mut contents = self.0.contents.write();
            let start = offset * bpe;
            let end = start + data.len() * bpe;
            if end > contents.bytes.len() {
                log::error!(
                    "Buffer '{}': partial update {}..{} exceeds {} bytes",
                    self.0.label,
                    start,
                    end,
                    contents.bytes.len()
                );
                return false;
            }
            contents.bytes[start..end].copy_from_slice(bytemuck::cast_slice(data));
            let range = UpdateRange {
                offset,
                count: data.len(),
            };
            contents.update_range = Some(match contents.update_range {
                Some(pending) => pending.union(range),
                None => range,
            });
        }
        self.0.version.bump();
        true
    }

    /// Flags the data as modified without touching it (full upload).
    pub fn needs_update(&self) {
        self.0.version.bump();
    }

    /// Returns the pending range and resets it to "whole buffer".
    pub fn take_update_range(&self) -> Option<UpdateRange> {
        self.0.contents.write().update_range.take()
    }
}

pub(crate) fn read_index(bytes: &[u8], element_type: ElementType, i: usize) -> Option<u32> {
    let bpe = element_type.bytes_per_element();
    let chunk = bytes.get(i * bpe..(i + 1) * bpe)?;
    match element_type {
        ElementType::UnsignedInt => Some(bytemuck::pod_read_unaligned::<u32>(chunk)),
        ElementType::UnsignedShort => Some(u32::from(bytemuck::pod_read_unaligned::<u16>(chunk))),
        ElementType::UnsignedByte => Some(u32::from(chunk[0])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_region_merges_pending_ranges() {
        let buffer = BufferRef::new(&[0.0f32; 16], 4, Some("test"));
        assert!(buffer.update_region(2, &[1.0f32, 2.0]));
        assert!(buffer.update_region(8, &[3.0f32]));
        assert_eq!(buffer.version(), 2);
        assert_eq!(
            buffer.take_update_range(),
            Some(UpdateRange { offset: 2, count: 7 })
        );
        assert_eq!(buffer.take_update_range(), None);
        assert_eq!(buffer.float_at(8), Some(3.0));
    }

    #[test]
    fn update_region_rejects_mismatched_types() {
        let buffer = BufferRef::new(&[0u16; 4], 1, None);
        assert!(!buffer.update_region(0, &[1.0f32]));
        assert!(!buffer.update_region(3, &[1u16, 2]));
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn index_reads_widen() {
        let buffer = BufferRef::new(&[7u16, 65_000], 1, None);
        assert_eq!(buffer.index_at(1), Some(65_000));
        assert_eq!(buffer.index_at(2), None);
        assert_eq!(buffer.vertex_count(), 2);
    }
}
