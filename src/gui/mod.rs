mod healthbar;
pub use self::healthbar::Healthbar;

use std::path::Path;

use nalgebra_glm::{vec2, TVec2};

use crate::{
    error::Result,
    obj_loader::{GuiVertex, MeshData, TexturedVertex},
    render_system::model::{ModelRegistry, TexturedModel},
    texture::TextureData,
};

/// A textured quad drawn over the scene. `position` is the quad centre in
/// normalised device coordinates (y up), `scale` its half-size.
#[derive(Clone, Debug, PartialEq)]
pub struct GuiTexture {
    pub texture: TexturedModel,
    pub position: TVec2<f32>,
    pub scale: TVec2<f32>,
}

impl GuiTexture {
    pub fn new(texture: TexturedModel, position: TVec2<f32>, scale: TVec2<f32>) -> Self {
        GuiTexture {
            texture,
            position,
            scale,
        }
    }

    /// Covers the whole window.
    pub fn full_screen(texture: TexturedModel) -> Self {
        GuiTexture::new(texture, vec2(0.0, 0.0), vec2(1.0, 1.0))
    }
}

impl GuiTexture {
    /// Registers `texture_file` for use on gui quads.
    pub fn load_model(
        registry: &mut ModelRegistry,
        texture_file: impl AsRef<Path>,
    ) -> Result<TexturedModel> {
        registry.generated("gui", texture_file, quad_mesh)
    }

    /// A single-colour gui texture, for when no image is at hand.
    pub fn solid_model(registry: &mut ModelRegistry, colour: [u8; 4]) -> TexturedModel {
        registry.insert(quad_mesh(), TextureData::solid(colour))
    }
}

// Gui quads are drawn from a shared strip; models still carry the quad so
// every registered model has geometry.
fn quad_mesh() -> MeshData {
    let vertices = GuiVertex::list()
        .iter()
        .map(|v| TexturedVertex {
            position: [v.position[0], v.position[1], 0.0],
            tex_coord: v.tex_coord,
            normal: [0.0, 0.0, 1.0],
        })
        .collect();
    MeshData {
        vertices,
        indices: vec![0, 1, 2, 2, 1, 3],
    }
}
