use std::path::Path;

use nalgebra_glm::TVec3;

use super::Entity;
use crate::{
    error::Result,
    render_system::model::{ModelRegistry, Transform},
};

/// A static prop loaded from an OBJ/TGA pair.
pub struct Terrain;

impl Terrain {
    #[allow(clippy::too_many_arguments)]
    pub fn load(
        registry: &mut ModelRegistry,
        obj_file: impl AsRef<Path>,
        texture_file: impl AsRef<Path>,
        position: TVec3<f32>,
        rot_x: f32,
        rot_y: f32,
        rot_z: f32,
        scale: f32,
    ) -> Result<Entity> {
        let model = ModelRegistry::textured(obj_file, texture_file).build(registry)?;
        Ok(Entity::new(
            model,
            Transform::new(position, rot_x, rot_y, rot_z, scale),
        ))
    }
}
