use super::device::{DrawCommand, DrawMode, GpuDevice, IndexBinding};
use super::info::RenderInfo;

/// Issues draw calls for one object and accounts for them in [`RenderInfo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferRenderer {
    mode: DrawMode,
    index: Option<IndexBinding>,
}

impl BufferRenderer {
    #[must_use]
    pub fn new(mode: DrawMode) -> Self {
        Self { mode, index: None }
    }

    pub fn set_mode(&mut self, mode: DrawMode) {
        self.mode = mode;
    }

    /// Switches to indexed drawing; `None` draws arrays.
    pub fn set_index(&mut self, index: Option<IndexBinding>) {
        self.index = index;
    }

    pub fn render(&self, device: &mut dyn GpuDevice, info: &mut RenderInfo, start: u32, count: u32) {
        device.draw(&DrawCommand {
            mode: self.mode,
            start,
            count,
            instance_count: None,
            index: self.index,
        });
        info.update(count, self.mode, 1);
    }

    /// Instanced draw. Without instancing support the draw is skipped and an
    /// error is logged.
    pub fn render_instances(
        &self,
        device: &mut dyn GpuDevice,
        info: &mut RenderInfo,
        start: u32,
        count: u32,
        instance_count: u32,
    ) -> bool {
        if instance_count == 0 {
            return false;
        }
        if !device.supports_instancing() {
            log::error!(
                "BufferRenderer: instanced draw requested but the device lacks instancing support"
            );
            return false;
        }
        device.draw(&DrawCommand {
            mode: self.mode,
            start,
            count,
            instance_count: Some(instance_count),
            index: self.index,
        });
        info.update(count, self.mode, instance_count);
        true
    }
}
