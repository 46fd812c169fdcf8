use super::device::DrawMode;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Geometries currently registered with the geometry registry
    pub geometries: u32,
    pub textures: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Incremented once per scene render; drives the per-frame update guard
    pub frame: u64,
    pub calls: u64,
    pub triangles: u64,
    pub points: u64,
    pub lines: u64,
}

/// Renderer statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderInfo {
    pub memory: MemoryInfo,
    pub render: FrameInfo,
    /// Reset the per-frame counters at the start of each render
    pub auto_reset: bool,
}

impl Default for RenderInfo {
    fn default() -> Self {
        Self {
            memory: MemoryInfo::default(),
            render: FrameInfo::default(),
            auto_reset: true,
        }
    }
}

impl RenderInfo {
    /// Accounts for one draw call of `count` vertices.
    ///
    /// Counters saturate instead of wrapping.
    pub fn update(&mut self, count: u32, mode: DrawMode, instance_count: u32) {
        let count = u64::from(count);
        let instances = u64::from(instance_count);
        let render = &mut self.render;
        render.calls = render.calls.saturating_add(1);
        let (counter, primitives) = match mode {
            DrawMode::Triangles => (&mut render.triangles, count / 3),
            DrawMode::Lines => (&mut render.lines, count / 2),
            DrawMode::LineStrip => (&mut render.lines, count.saturating_sub(1)),
            DrawMode::LineLoop => (&mut render.lines, count),
            DrawMode::Points => (&mut render.points, count),
        };
        *counter = counter.saturating_add(instances.saturating_mul(primitives));
    }

    /// Starts a new frame, resetting counters when `auto_reset` is set.
    pub fn begin_frame(&mut self) {
        if self.auto_reset {
            self.reset();
        }
        self.render.frame += 1;
    }

    /// Clears the per-frame counters. The frame number is kept.
    pub fn reset(&mut self) {
        self.render.calls = 0;
        self.render.triangles = 0;
        self.render.points = 0;
        self.render.lines = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instanced_triangles_are_multiplied() {
        let mut info = RenderInfo::default();
        info.update(6, DrawMode::Triangles, 4);
        info.update(3, DrawMode::LineStrip, 1);
        assert_eq!(info.render.calls, 2);
        assert_eq!(info.render.triangles, 8);
        assert_eq!(info.render.lines, 2);
    }

    #[test]
    fn large_instanced_draws_do_not_overflow() {
        let mut info = RenderInfo::default();
        info.update(500_000, DrawMode::Triangles, 30_000);
        assert_eq!(info.render.triangles, 30_000 * 166_666);

        info.update(u32::MAX, DrawMode::Points, u32::MAX);
        info.update(u32::MAX, DrawMode::Points, u32::MAX);
        assert_eq!(info.render.points, u64::MAX);
        assert_eq!(info.render.calls, 3);
    }

    #[test]
    fn begin_frame_keeps_frame_counter() {
        let mut info = RenderInfo::default();
        info.update(3, DrawMode::Points, 1);
        info.begin_frame();
        info.begin_frame();
        assert_eq!(info.render.frame, 2);
        assert_eq!(info.render.points, 0);
    }
}
