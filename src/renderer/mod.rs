//! Rendering core
//!
//! - [`core`]: identity-keyed GPU resource registries behind [`GpuDevice`](core::GpuDevice)
//! - [`lists`]: per-frame render lists and their sort rules
//! - [`clipping`]: camera-space clipping-plane projection
//! - [`state`]: color/depth/stencil buffer state with locks
//! - [`backend`]: the [`Renderer`] surface the post-processing graph drives
//! - [`graph`]: passes and the [`EffectComposer`](graph::EffectComposer)
//! - [`headless`]: CPU implementation of [`Renderer`]

pub mod backend;
pub mod clipping;
pub mod core;
pub mod graph;
pub mod headless;
pub mod lists;
pub mod state;

pub use backend::{ClearFlags, Renderer};
pub use clipping::{Clipping, ClippingUniform, project_planes};
pub use headless::{DrawRecord, HeadlessRenderer, RecordingDevice, Surface};
pub use lists::{
    Bucket, Drawable, RenderItem, RenderItemCompare, RenderList, RenderLists, painter_sort_stable,
    reverse_painter_sort_stable,
};
pub use state::{ColorBufferState, DepthBufferState, DrawState, StencilBufferState};
