use crate::errors::Result;
use crate::renderer::graph::pass::{FullScreenQuad, Pass, PassContext, PassState};
use crate::resources::{ShaderMaterial, UniformValue, Uniforms};

/// Runs a fullscreen material over the read buffer.
///
/// The read buffer's texture is bound to the uniform named by `texture_id`
/// (`tDiffuse` unless changed) when the material declares it. Output goes to
/// the write buffer, or to the screen for the last pass.
#[derive(Debug)]
pub struct ShaderPass {
    state: PassState,
    name: String,
    pub texture_id: String,
    quad: FullScreenQuad,
}

impl ShaderPass {
    /// Accepts a ready material or a [`ShaderDefinition`](crate::resources::ShaderDefinition),
    /// whose uniforms are cloned.
    #[must_use]
    pub fn new(material: impl Into<ShaderMaterial>) -> Self {
        let material = material.into();
        Self {
            state: PassState::default(),
            name: format!("ShaderPass({})", material.name),
            texture_id: "tDiffuse".to_string(),
            quad: FullScreenQuad::new(material),
        }
    }

    #[must_use]
    pub fn with_texture_id(mut self, texture_id: &str) -> Self {
        self.texture_id = texture_id.to_string();
        self
    }

    #[must_use]
    pub fn material(&self) -> &ShaderMaterial {
        self.quad.material()
    }

    pub fn material_mut(&mut self) -> &mut ShaderMaterial {
        self.quad.material_mut()
    }

    #[must_use]
    pub fn uniforms(&self) -> &Uniforms {
        self.quad.material().uniforms()
    }

    /// Updates an existing uniform; see [`ShaderMaterial::set_uniform`].
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> bool {
        self.quad.material_mut().set_uniform(name, value)
    }
}

impl Pass for ShaderPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> &PassState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PassState {
        &mut self.state
    }

    fn render(&mut self, ctx: &mut PassContext<'_>) -> Result<()> {
        let texture = UniformValue::Texture(Some(ctx.read_buffer.texture()));
        self.quad.material_mut().set_uniform(&self.texture_id, texture);

        let renderer = &mut *ctx.renderer;
        if self.state.render_to_screen {
            renderer.set_render_target(None);
        } else {
            renderer.set_render_target(Some(ctx.write_buffer));
            if self.state.clear {
                let flags = renderer.auto_clear_flags();
                renderer.clear(flags)?;
            }
        }
        self.quad.render(renderer)
    }
}
