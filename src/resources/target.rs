use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TARGET_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(u64);

/// Handle of the color texture a render target resolves into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

/// Allocation options shared by every target a composer creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetOptions {
    pub format: wgpu::TextureFormat,
    pub depth_buffer: bool,
    pub stencil_buffer: bool,
}

impl Default for RenderTargetOptions {
    fn default() -> Self {
        Self {
            format: wgpu::TextureFormat::Rgba16Float,
            depth_buffer: true,
            stencil_buffer: false,
        }
    }
}

/// Descriptor of an off-screen render target.
///
/// Cloning copies the handle (same identity); [`RenderTarget::duplicate`]
/// creates a new target with the same configuration. Backends allocate the
/// storage lazily when the target is bound and reallocate on size changes.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    id: RenderTargetId,
    texture: TextureId,
    pub label: String,
    width: u32,
    height: u32,
    options: RenderTargetOptions,
}

impl RenderTarget {
    #[must_use]
    pub fn new(width: u32, height: u32, options: RenderTargetOptions) -> Self {
        Self {
            id: RenderTargetId(NEXT_TARGET_ID.fetch_add(1, Ordering::Relaxed)),
            texture: TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed)),
            label: String::from("RenderTarget"),
            width: width.max(1),
            height: height.max(1),
            options,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// A new target with identical configuration and fresh identity.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self::new(self.width, self.height, self.options).with_label(&self.label)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &RenderTargetOptions {
        &self.options
    }

    #[inline]
    #[must_use]
    pub fn has_stencil(&self) -> bool {
        self.options.stencil_buffer
    }

    #[inline]
    #[must_use]
    pub fn has_depth(&self) -> bool {
        self.options.depth_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_identity_and_clamps() {
        let mut target = RenderTarget::new(8, 8, RenderTargetOptions::default());
        let (id, texture) = (target.id(), target.texture());

        target.set_size(0, 3);

        assert_eq!(target.size(), (1, 3));
        assert_eq!((target.id(), target.texture()), (id, texture));
    }
}
