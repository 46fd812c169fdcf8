//! Concrete passes.

mod clear;
mod mask;
mod render;
mod shader;

pub use clear::ClearPass;
pub use mask::{ClearMaskPass, MaskPass};
pub use render::RenderPass;
pub use shader::ShaderPass;
