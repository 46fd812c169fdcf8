use super::buffer::{BufferId, BufferRef, Element, ElementType};

/// A typed view into a [`BufferRef`].
///
/// Plain attributes own their buffer. Interleaved attributes are several views
/// sharing one buffer at different offsets; upload caches always key on the
/// shared buffer, so an interleaved store is uploaded once.
#[derive(Debug, Clone)]
pub struct Attribute {
    buffer: BufferRef,
    /// Components per vertex (3 for positions, 16 for instance matrices)
    pub item_size: usize,
    /// Element offset inside each stride (interleaved views only)
    pub offset: usize,
    pub normalized: bool,
    interleaved: bool,
}

impl Attribute {
    #[must_use]
    pub fn new<T: Element>(data: &[T], item_size: usize) -> Self {
        Self {
            buffer: BufferRef::new(data, item_size, None),
            item_size,
            offset: 0,
            normalized: false,
            interleaved: false,
        }
    }

    #[must_use]
    pub fn from_buffer(buffer: BufferRef, item_size: usize) -> Self {
        Self {
            buffer,
            item_size,
            offset: 0,
            normalized: false,
            interleaved: false,
        }
    }

    /// A view into an interleaved buffer (the buffer's stride spans all views).
    #[must_use]
    pub fn interleaved(buffer: &BufferRef, item_size: usize, offset: usize) -> Self {
        Self {
            buffer: buffer.clone(),
            item_size,
            offset,
            normalized: false,
            interleaved: true,
        }
    }

    #[must_use]
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// The backing store, which is what GPU caches key on.
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &BufferRef {
        &self.buffer
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> BufferId {
        self.buffer.id()
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    #[inline]
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        self.buffer.element_type()
    }

    #[inline]
    #[must_use]
    pub fn is_interleaved(&self) -> bool {
        self.interleaved
    }

    /// Number of vertices (or indices, for an index attribute).
    #[must_use]
    pub fn count(&self) -> usize {
        if self.interleaved {
            self.buffer.vertex_count()
        } else {
            self.buffer.len() / self.item_size.max(1)
        }
    }

    /// Component `component` of vertex `i`, read as `f32`.
    #[must_use]
    pub fn component(&self, i: usize, component: usize) -> Option<f32> {
        let stride = if self.interleaved {
            self.buffer.stride()
        } else {
            self.item_size
        };
        self.buffer.float_at(i * stride + self.offset + component)
    }
}
