pub mod ground;
pub mod main_character;
pub mod mesh_wrapper;
pub mod terrain;

pub use self::{ground::Ground, main_character::MainCharacter, mesh_wrapper::MeshWrapper, terrain::Terrain};

use nalgebra_glm::TMat4;

use crate::render_system::model::{Material, ModelId, TexturedModel, Transform};

/// A textured model placed in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub model: TexturedModel,
    pub transform: Transform,
    pub material: Material,
}

impl Entity {
    pub fn new(model: TexturedModel, transform: Transform) -> Self {
        Entity {
            model,
            transform,
            material: Material::default(),
        }
    }

    pub fn with_material(mut self, reflectivity: f32, shine_damper: f32) -> Self {
        self.material = Material {
            reflectivity,
            shine_damper,
        };
        self
    }

    pub fn model_id(&self) -> ModelId {
        self.model.id
    }

    pub fn transformation_matrix(&self) -> TMat4<f32> {
        self.transform.create_transformation_matrix()
    }
}
