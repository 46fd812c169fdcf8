//! Post-processing graph
//!
//! - [`Pass`]: one stage, with its shared [`PassState`] flags
//! - [`passes`]: `ClearPass`, `RenderPass`, `MaskPass`, `ClearMaskPass`, `ShaderPass`
//! - [`EffectComposer`]: sequences passes over two ping-pong targets

pub mod composer;
pub mod pass;
pub mod passes;

pub use composer::EffectComposer;
pub use pass::{FullScreenQuad, MaskRole, Pass, PassContext, PassState};
pub use passes::{ClearMaskPass, ClearPass, MaskPass, RenderPass, ShaderPass};
