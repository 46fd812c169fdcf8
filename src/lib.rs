//! # strata
//!
//! Post-processing compositor and GPU resource tracking for a scene renderer.
//!
//! - [`EffectComposer`] sequences [`Pass`]es over two ping-pong render targets,
//!   routing the last enabled pass to the screen and carrying stencil masks.
//! - [`RenderList`](renderer::RenderList) buckets and stably sorts the drawables
//!   of each frame.
//! - The registries in [`renderer::core`] keep GPU buffers in step with CPU data
//!   by version, at most once per frame, and release them on disposal.
//! - [`Clipping`](renderer::Clipping) projects clipping planes into camera space.
//!
//! [`HeadlessRenderer`] implements the whole stack on the CPU.
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let renderer = HeadlessRenderer::new(RendererSettings::default());
//! let mut composer = EffectComposer::new(renderer);
//! composer.add_pass(RenderPass::new(scene, camera));
//! composer.add_pass(ShaderPass::new(&COPY_SHADER));
//! composer.render(Some(1.0 / 60.0))?;
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;

pub use errors::{Result, StrataError};
pub use renderer::graph::{
    ClearMaskPass, ClearPass, EffectComposer, FullScreenQuad, MaskPass, MaskRole, Pass,
    PassContext, PassState, RenderPass, ShaderPass,
};
pub use renderer::{ClearFlags, HeadlessRenderer, Renderer};
pub use resources::{
    Attribute, BufferGeometry, BufferRef, COPY_SHADER, Geometry, Material, Plane, PolygonGeometry,
    RenderTarget, ShaderDefinition, ShaderMaterial, UniformValue,
};
pub use scene::{Camera, Mesh, Scene, SharedCamera, SharedScene};
pub use settings::{ComposerSettings, RendererSettings};

pub mod prelude {
    pub use crate::renderer::Renderer;
    pub use crate::resources::{
        Attribute, BufferGeometry, COPY_SHADER, Material, Plane, RenderTarget, ShaderMaterial,
        UniformValue,
    };
    pub use crate::scene::{Camera, Mesh, Scene, shared_camera, shared_scene};
    pub use crate::settings::{ComposerSettings, RendererSettings};
    pub use crate::{
        ClearMaskPass, ClearPass, EffectComposer, HeadlessRenderer, MaskPass, Pass, RenderPass,
        ShaderPass,
    };
}
